//! Read-only queries over the platform's log tables.
//!
//! Each [`LogSource`] is projected onto one row shape
//! (`id, timestamp, log_type, status, level, pathname, event_message,
//! method`) and the sources are glued together with `UNION ALL` inside a
//! `logs` CTE. The three public queries read from that CTE:
//!
//! - [`AnalyticsComposer::logs_query`]: newest rows first, one `LIMIT`
//!   applied after the union
//! - [`AnalyticsComposer::chart_query`]: ok/warning/error counts for
//!   every bucket of the range, empty buckets included
//! - [`AnalyticsComposer::count_query`]: the total plus per-dimension
//!   facet counts
//!
//! The SQL uses the log store's dialect (`TIMESTAMP_TRUNC`, `COUNTIF`,
//! `UNNEST`).

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use pgscribe_config::AnalyticsConfig;
use pgscribe_sql::Lit;

use crate::AnalyticsError;

mod filter;
pub use filter::{LogField, LogFilter, LogFilterOp};
use filter::where_clause;

mod source;
pub use source::LogSource;

/// Values reported per facet dimension.
pub const MAX_FACET_VALUES: u32 = 20;

/// Chart bucket granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketWidth {
    Minute,
    Hour,
    Day,
}

impl BucketWidth {
    /// Day buckets from two days up, hour buckets from twelve hours up,
    /// minute buckets below that.
    pub fn for_span(span: TimeDelta) -> Self {
        if span >= TimeDelta::days(2) {
            BucketWidth::Day
        } else if span >= TimeDelta::hours(12) {
            BucketWidth::Hour
        } else {
            BucketWidth::Minute
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            BucketWidth::Minute => "MINUTE",
            BucketWidth::Hour => "HOUR",
            BucketWidth::Day => "DAY",
        }
    }

    pub fn duration(self) -> TimeDelta {
        match self {
            BucketWidth::Minute => TimeDelta::minutes(1),
            BucketWidth::Hour => TimeDelta::hours(1),
            BucketWidth::Day => TimeDelta::days(1),
        }
    }
}

/// A half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AnalyticsError> {
        if end <= start {
            return Err(AnalyticsError::InvalidRange(format!(
                "end {end} is not after start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The `span` leading up to `end`.
    pub fn last(span: TimeDelta, end: DateTime<Utc>) -> Result<Self, AnalyticsError> {
        Self::new(end - span, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn span(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// What to read and how much of it.
#[derive(Debug, Clone, PartialEq)]
pub struct LogQuerySpec {
    pub sources: Vec<LogSource>,
    pub range: TimeRange,
    /// Chart granularity; picked from the range when `None`
    pub bucket: Option<BucketWidth>,
    pub filters: Vec<LogFilter>,
    /// Row limit; the configured default when `None`
    pub limit: Option<u32>,
}

impl LogQuerySpec {
    /// All [`LogSource::UNIFIED`] sources over `range`.
    pub fn new(range: TimeRange) -> Self {
        Self {
            sources: LogSource::UNIFIED.to_vec(),
            range,
            bucket: None,
            filters: Vec::new(),
            limit: None,
        }
    }

    pub fn sources(mut self, sources: impl IntoIterator<Item = LogSource>) -> Self {
        self.sources = sources.into_iter().collect();
        self
    }

    pub fn bucket(mut self, width: BucketWidth) -> Self {
        self.bucket = Some(width);
        self
    }

    pub fn filter(mut self, filter: LogFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn bucket_width(&self) -> BucketWidth {
        self.bucket
            .unwrap_or_else(|| BucketWidth::for_span(self.range.span()))
    }

    /// Number of rows the chart query returns: one per bucket from the
    /// bucket holding `start` up to the one holding the last instant
    /// before `end`.
    pub fn bucket_count(&self) -> Result<u64, AnalyticsError> {
        let width = self.bucket_width().duration();
        let first = self
            .range
            .start
            .duration_trunc(width)
            .map_err(|e| AnalyticsError::InvalidRange(e.to_string()))?;
        let too_wide = || AnalyticsError::InvalidRange("range too wide".to_string());
        let span = (self.range.end - first)
            .num_microseconds()
            .ok_or_else(too_wide)?;
        let step = width.num_microseconds().ok_or_else(too_wide)?;
        Ok(span.unsigned_abs().div_ceil(step.unsigned_abs()))
    }
}

/// Builds log queries.
#[derive(Debug, Clone)]
pub struct AnalyticsComposer {
    default_limit: u32,
    max_limit: u32,
}

impl Default for AnalyticsComposer {
    fn default() -> Self {
        Self::new(&AnalyticsConfig::default())
    }
}

impl AnalyticsComposer {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            default_limit: config.default_limit(),
            max_limit: config.max_limit(),
        }
    }

    /// The limit actually applied: the default when none was asked for,
    /// clamped to the maximum otherwise.
    pub fn resolve_limit(&self, requested: Option<u32>) -> Result<u32, AnalyticsError> {
        match requested {
            None => Ok(self.default_limit),
            Some(0) => Err(AnalyticsError::InvalidLimit),
            Some(n) => Ok(n.min(self.max_limit)),
        }
    }

    /// Newest rows across all sources.
    pub fn logs_query(&self, spec: &LogQuerySpec) -> Result<String, AnalyticsError> {
        let limit = self.resolve_limit(spec.limit)?;
        let mut lines = vec![
            logs_cte(spec)?,
            format!("SELECT {}", projection()),
            "FROM logs".to_string(),
        ];
        push_nonempty(&mut lines, where_clause(&spec.filters, &[])?);
        lines.push("ORDER BY timestamp DESC".to_string());
        lines.push(format!("LIMIT {limit}"));

        tracing::debug!(sources = spec.sources.len(), limit, "composed logs query");
        Ok(lines.join("\n"))
    }

    /// Per-bucket ok/warning/error counts, one row per bucket.
    pub fn chart_query(&self, spec: &LogQuerySpec) -> Result<String, AnalyticsError> {
        let unit = spec.bucket_width().unit();
        let start = timestamp(spec.range.start);
        let end = timestamp(spec.range.end);

        let mut lines = vec![
            format!("{},", logs_cte(spec)?),
            "buckets AS (".to_string(),
            format!(
                "SELECT bucket FROM UNNEST(GENERATE_TIMESTAMP_ARRAY(TIMESTAMP_TRUNC({start}, {unit}), TIMESTAMP_SUB({end}, INTERVAL 1 MICROSECOND), INTERVAL 1 {unit})) AS bucket"
            ),
            "),".to_string(),
            "counts AS (".to_string(),
            format!(
                "SELECT TIMESTAMP_TRUNC(timestamp, {unit}) AS bucket, COUNTIF(level = 'success') AS ok, COUNTIF(level = 'warning') AS warning, COUNTIF(level = 'error') AS error"
            ),
            "FROM logs".to_string(),
        ];
        push_nonempty(&mut lines, where_clause(&spec.filters, &[])?);
        lines.extend([
            "GROUP BY bucket".to_string(),
            ")".to_string(),
            "SELECT buckets.bucket AS time_bucket, COALESCE(counts.ok, 0) AS ok, COALESCE(counts.warning, 0) AS warning, COALESCE(counts.error, 0) AS error".to_string(),
            "FROM buckets".to_string(),
            "LEFT JOIN counts ON counts.bucket = buckets.bucket".to_string(),
            "ORDER BY time_bucket ASC".to_string(),
        ]);

        tracing::debug!(unit, sources = spec.sources.len(), "composed chart query");
        Ok(lines.join("\n"))
    }

    /// Total row count plus the top values of each facet dimension.
    ///
    /// A dimension's own filter is left out of its facet, so each facet
    /// shows what selecting only that value would return.
    pub fn count_query(&self, spec: &LogQuerySpec) -> Result<String, AnalyticsError> {
        let mut lines = vec![format!("{},", logs_cte(spec)?)];

        for (i, facet) in LogField::FACETS.into_iter().enumerate() {
            let others = spec.filters.iter().filter(|f| f.field != facet);
            let present = format!("{facet} IS NOT NULL");
            lines.push(format!("{facet}_count AS ("));
            lines.push(format!(
                "SELECT '{facet}' AS dimension, {facet} AS value, COUNT(*) AS count"
            ));
            lines.push("FROM logs".to_string());
            lines.push(where_clause(others, &[present])?);
            lines.push(format!("GROUP BY {facet}"));
            lines.push("ORDER BY count DESC".to_string());
            lines.push(format!("LIMIT {MAX_FACET_VALUES}"));
            let last = i + 1 == LogField::FACETS.len();
            lines.push(if last { ")" } else { ")," }.to_string());
        }

        lines.push("SELECT 'total' AS dimension, 'all' AS value, COUNT(*) AS count".to_string());
        lines.push("FROM logs".to_string());
        push_nonempty(&mut lines, where_clause(&spec.filters, &[])?);
        for facet in LogField::FACETS {
            lines.push("UNION ALL".to_string());
            lines.push(format!("SELECT dimension, value, count FROM {facet}_count"));
        }

        Ok(lines.join("\n"))
    }
}

/// Columns of the common row shape, in order.
const COLUMNS: [&str; 8] = [
    "id",
    "timestamp",
    "log_type",
    "status",
    "level",
    "pathname",
    "event_message",
    "method",
];

fn projection() -> String {
    COLUMNS.join(", ")
}

fn push_nonempty(lines: &mut Vec<String>, line: String) {
    if !line.is_empty() {
        lines.push(line);
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    format!("TIMESTAMP '{}'", at.format("%Y-%m-%d %H:%M:%S%.6f+00"))
}

/// `WITH logs AS (<one SELECT per source> UNION ALL ...)`
fn logs_cte(spec: &LogQuerySpec) -> Result<String, AnalyticsError> {
    let mut sources: Vec<LogSource> = Vec::with_capacity(spec.sources.len());
    for source in &spec.sources {
        if !sources.contains(source) {
            sources.push(*source);
        }
    }
    if sources.is_empty() {
        return Err(AnalyticsError::EmptySources);
    }

    let branches = sources
        .into_iter()
        .map(|source| branch(source, &spec.range))
        .collect::<Vec<_>>();
    Ok(format!("WITH logs AS (\n{}\n)", branches.join("\nUNION ALL\n")))
}

/// One source projected onto the common row shape, limited to `range`.
fn branch(source: LogSource, range: &TimeRange) -> String {
    let def = source.def();
    let ts = def.timestamp;

    let mut conditions = vec![
        format!("{ts} >= {}", timestamp(range.start)),
        format!("{ts} < {}", timestamp(range.end)),
    ];
    conditions.extend(def.narrowing.iter().map(|c| c.to_string()));

    let level = format!(
        "CASE WHEN {} THEN 'error' WHEN {} THEN 'warning' ELSE 'success' END",
        def.error, def.warning
    );
    let log_type = Lit(def.log_type).to_string();
    let exprs: [&str; 8] = [
        def.id,
        ts,
        &log_type,
        def.status,
        &level,
        def.pathname,
        def.event_message,
        def.method,
    ];
    let columns = exprs
        .iter()
        .zip(COLUMNS)
        .map(|(expr, alias)| format!("{expr} AS {alias}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "SELECT {columns}\nFROM {}\nWHERE {}",
        def.from,
        conditions.join(" AND ")
    )
}
