//! Log sources and how each one maps onto the common row shape.

use std::fmt;
use std::str::FromStr;

use crate::AnalyticsError;

/// A log stream that can take part in a unified query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogSource {
    /// API gateway requests that are neither REST nor storage
    Edge,
    /// REST API requests, read from the edge table
    Postgrest,
    /// Storage API requests, read from the edge table
    Storage,
    Postgres,
    /// Edge function invocations
    FunctionEdge,
    /// Console output of edge functions
    Function,
    Auth,
}

impl LogSource {
    pub const ALL: [LogSource; 7] = [
        LogSource::Edge,
        LogSource::Postgrest,
        LogSource::Storage,
        LogSource::Postgres,
        LogSource::FunctionEdge,
        LogSource::Function,
        LogSource::Auth,
    ];

    /// Sources of a unified request log. Function console output is left
    /// out; it belongs to the invocation it came from.
    pub const UNIFIED: [LogSource; 6] = [
        LogSource::Edge,
        LogSource::Postgrest,
        LogSource::Storage,
        LogSource::Postgres,
        LogSource::FunctionEdge,
        LogSource::Auth,
    ];

    /// Value of the `log_type` column for rows of this source.
    pub fn log_type(self) -> &'static str {
        self.def().log_type
    }

    /// The table actually scanned.
    pub fn table(self) -> &'static str {
        self.def().table
    }

    pub(super) fn def(self) -> &'static SourceDef {
        match self {
            LogSource::Edge => &EDGE,
            LogSource::Postgrest => &POSTGREST,
            LogSource::Storage => &STORAGE,
            LogSource::Postgres => &POSTGRES,
            LogSource::FunctionEdge => &FUNCTION_EDGE,
            LogSource::Function => &FUNCTION,
            LogSource::Auth => &AUTH,
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.log_type())
    }
}

impl FromStr for LogSource {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LogSource::ALL
            .into_iter()
            .find(|source| {
                source.log_type().eq_ignore_ascii_case(wanted)
                    || source.table().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| AnalyticsError::UnknownField(wanted.to_string()))
    }
}

/// How one source projects onto the common row shape.
///
/// Every expression is trusted, fixed text; caller input never reaches it.
pub(super) struct SourceDef {
    pub log_type: &'static str,
    pub table: &'static str,
    /// Everything after `FROM`: the table, its alias and the joins that
    /// flatten its metadata.
    pub from: &'static str,
    pub id: &'static str,
    pub timestamp: &'static str,
    pub status: &'static str,
    /// Rows matching this are `error`
    pub error: &'static str,
    /// Rows matching this (and not `error`) are `warning`
    pub warning: &'static str,
    pub pathname: &'static str,
    pub event_message: &'static str,
    pub method: &'static str,
    /// Extra predicates that carve this source out of a shared table.
    pub narrowing: &'static [&'static str],
}

const NULL_TEXT: &str = "CAST(NULL AS STRING)";

const EDGE_FROM: &str = "edge_logs AS el\n\
    CROSS JOIN UNNEST(el.metadata) AS el_metadata\n\
    CROSS JOIN UNNEST(el_metadata.request) AS el_request\n\
    CROSS JOIN UNNEST(el_metadata.response) AS el_response";

const REST_PATH: &str = "el_request.path LIKE '%/rest/%'";
const STORAGE_PATH: &str = "el_request.path LIKE '%/storage/%'";

/// The three request sources share everything but their name and narrowing.
const fn edge_like(log_type: &'static str, narrowing: &'static [&'static str]) -> SourceDef {
    SourceDef {
        log_type,
        table: "edge_logs",
        from: EDGE_FROM,
        id: "el.id",
        timestamp: "el.timestamp",
        status: "CAST(el_response.status_code AS STRING)",
        error: "el_response.status_code >= 500",
        warning: "el_response.status_code BETWEEN 400 AND 499",
        pathname: "el_request.path",
        event_message: NULL_TEXT,
        method: "el_request.method",
        narrowing,
    }
}

static EDGE: SourceDef = edge_like(
    "edge",
    &[
        "el_request.path NOT LIKE '%/rest/%'",
        "el_request.path NOT LIKE '%/storage/%'",
    ],
);

static POSTGREST: SourceDef = edge_like("postgrest", &[REST_PATH]);

static STORAGE: SourceDef = edge_like("storage", &[STORAGE_PATH]);

static POSTGRES: SourceDef = SourceDef {
    log_type: "postgres",
    table: "postgres_logs",
    from: "postgres_logs AS pgl\n\
        CROSS JOIN UNNEST(pgl.metadata) AS pgl_metadata\n\
        CROSS JOIN UNNEST(pgl_metadata.parsed) AS pgl_parsed",
    id: "pgl.id",
    timestamp: "pgl.timestamp",
    status: "CAST(pgl_parsed.sql_state_code AS STRING)",
    error: "pgl_parsed.error_severity IN ('ERROR', 'FATAL', 'PANIC')",
    warning: "pgl_parsed.error_severity = 'WARNING'",
    pathname: NULL_TEXT,
    event_message: "pgl.event_message",
    method: NULL_TEXT,
    narrowing: &[],
};

static FUNCTION_EDGE: SourceDef = SourceDef {
    log_type: "edge function",
    table: "function_edge_logs",
    from: "function_edge_logs AS fel\n\
        CROSS JOIN UNNEST(fel.metadata) AS fel_metadata\n\
        CROSS JOIN UNNEST(fel_metadata.response) AS fel_response\n\
        CROSS JOIN UNNEST(fel_metadata.request) AS fel_request",
    id: "fel.id",
    timestamp: "fel.timestamp",
    status: "CAST(fel_response.status_code AS STRING)",
    error: "fel_response.status_code >= 500",
    warning: "fel_response.status_code BETWEEN 400 AND 499",
    pathname: "fel_request.pathname",
    event_message: NULL_TEXT,
    method: "fel_request.method",
    narrowing: &[],
};

static FUNCTION: SourceDef = SourceDef {
    log_type: "function",
    table: "function_logs",
    from: "function_logs AS fl\n\
        CROSS JOIN UNNEST(fl.metadata) AS fl_metadata",
    id: "fl.id",
    timestamp: "fl.timestamp",
    status: NULL_TEXT,
    error: "LOWER(fl_metadata.level) = 'error'",
    warning: "LOWER(fl_metadata.level) IN ('warn', 'warning')",
    pathname: NULL_TEXT,
    event_message: "fl.event_message",
    method: NULL_TEXT,
    narrowing: &[],
};

static AUTH: SourceDef = SourceDef {
    log_type: "auth",
    table: "auth_logs",
    from: "auth_logs AS al\n\
        CROSS JOIN UNNEST(al.metadata) AS al_metadata\n\
        LEFT JOIN (\n\
        edge_logs AS al_el\n\
        CROSS JOIN UNNEST(al_el.metadata) AS al_el_metadata\n\
        CROSS JOIN UNNEST(al_el_metadata.response) AS al_el_response\n\
        CROSS JOIN UNNEST(al_el_response.headers) AS al_el_response_headers\n\
        CROSS JOIN UNNEST(al_el_metadata.request) AS al_el_request\n\
        ) ON al_metadata.request_id = al_el_response_headers.cf_ray",
    id: "al.id",
    timestamp: "al.timestamp",
    status: "CAST(al_el_response.status_code AS STRING)",
    error: "al_el_response.status_code >= 500",
    warning: "al_el_response.status_code BETWEEN 400 AND 499",
    pathname: "al_el_request.path",
    event_message: "al.event_message",
    method: "al_el_request.method",
    narrowing: &["al_metadata.request_id IS NOT NULL"],
};
