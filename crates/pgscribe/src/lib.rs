//! SQL synthesis for a Postgres management backend.
//!
//! This crate provides:
//! - Injection-safe statement text from structured specs ([`statement`])
//! - A migration history table and transactional apply ([`migrations`])
//! - Classification of executed DDL into invalidation events ([`entity`])
//! - Read-only queries over the platform's log tables ([`analytics`])
//!
//! Every generated string is built from the AST and quoting primitives in
//! [`sql`]; caller text only ever reaches the output as an escaped literal,
//! a quoted identifier or a dollar-quoted body with a random tag.
//!
//! # Transactions
//!
//! Batches are wrapped with [`sql::wrap`] / [`sql::wrap_statements`]:
//!
//! ```
//! use pgscribe::sql::{Terminal, wrap_statements};
//!
//! let batch = wrap_statements(&["select 1", "select 2 -- trailing"], Terminal::Rollback);
//! assert!(batch.starts_with("begin;\n"));
//! assert!(batch.ends_with("rollback;"));
//! ```
//!
//! # Migrations
//!
//! ```ignore
//! let tracker = MigrationTracker::new(&config.migrations());
//! tracker.bootstrap(&client).await?;
//! tracker
//!     .apply(&client, &MigrationRequest::new("create table t (id int)").name("add t"))
//!     .await?;
//! ```

pub mod analytics;
pub mod config;
pub mod entity;
mod error;
pub mod migrations;
pub mod statement;
mod traced;

pub use pgscribe_schema as schema;
pub use pgscribe_sql as sql;

pub use analytics::{AnalyticsComposer, LogQuerySpec, LogSource, TimeRange};
pub use config::ConfigError;
pub use entity::{EntityExtractor, EntityType, InvalidationEvent, extract_entity};
pub use error::{AnalyticsError, Error, Result, StatementError, TrackingError};
pub use migrations::{MigrationRequest, MigrationTracker};
pub use statement::{StatementBuilder, StatementSpec};
pub use traced::{Connection, ConnectionExt, TracedConn};
