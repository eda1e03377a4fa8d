use pgscribe_schema::UnknownOperator;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors from turning a statement spec into SQL text.
///
/// These are programmer errors: the input was malformed, retrying won't help.
#[derive(Debug, Error)]
pub enum StatementError {
    #[error("table {table} has no columns")]
    InvalidTable { table: String },

    #[error("invalid filter on {target}: {reason}")]
    InvalidFilter { target: String, reason: String },

    #[error("no value to {action}")]
    EmptyPayload { action: &'static str },

    #[error("table {table} has no primary key or unique column to upsert on")]
    MissingConflictTarget { table: String },

    #[error("invalid payload for column {column}: {reason}")]
    InvalidPayload { column: String, reason: String },

    #[error("refusing to {action} every row of {table}: no filters given")]
    MutationWithoutFilter { action: &'static str, table: String },

    /// A filter operator name from the caller that maps to no operator.
    #[error(transparent)]
    UnknownOperator(#[from] UnknownOperator),
}

/// Errors from composing log analytics queries.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("filter on {field} rejected: {reason}")]
    InjectionRisk { field: String, reason: String },

    #[error("unknown log field {0}")]
    UnknownField(String),

    #[error("no log sources to query")]
    EmptySources,

    #[error("invalid time range: {0}")]
    InvalidRange(String),

    #[error("limit must be at least 1")]
    InvalidLimit,
}

/// Errors from applying and recording migrations.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// Creating the history schema/table failed; nothing was applied.
    #[error("migration tracking bootstrap failed: {message}")]
    TrackingBootstrapFailed {
        message: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// The database rejected the batch; `message` is its error verbatim.
    #[error("{message}")]
    TransactionAborted {
        message: String,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

impl TrackingError {
    pub(crate) fn bootstrap(source: tokio_postgres::Error) -> Self {
        TrackingError::TrackingBootstrapFailed {
            message: db_message(&source),
            source,
        }
    }

    pub(crate) fn aborted(source: tokio_postgres::Error) -> Self {
        TrackingError::TransactionAborted {
            message: db_message(&source),
            source,
        }
    }
}

/// The server's own message when there is one, otherwise the client error.
pub(crate) fn db_message(e: &tokio_postgres::Error) -> String {
    match e.as_db_error() {
        Some(db) => db.message().to_string(),
        None => e.to_string(),
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Statement(#[from] StatementError),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
