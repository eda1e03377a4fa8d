//! Migration history tracking.
//!
//! Every applied schema change is recorded in a history table
//! (`supabase_migrations.schema_migrations` by default) so it can be
//! exported as migration files later. The tracker can either render the
//! whole `begin; ... commit;` text for an external transport
//! ([`MigrationTracker::render_apply`]) or drive a live connection
//! ([`MigrationTracker::apply`]).
//!
//! Recording is guarded by the history table's existence: a missing table
//! makes the record step a no-op rather than an error. Bootstrap failures
//! abort the caller's statements too, so a change never lands unrecorded.

use chrono::{DateTime, Utc};
use pgscribe_config::MigrationsConfig;
use pgscribe_sql::{
    ColumnName, ConflictAction, DollarQuoted, Expr, FromClause, Ident, InsertStmt, Lit,
    OnConflict, QualifiedTable, SelectColumn, SelectStmt, Terminal, UpdateAssignment, UpdateStmt,
    quote_qualified, render_compact, wrap_statements,
};

use crate::error::db_message;
use crate::{Connection, ConnectionExt, TrackingError};

/// Format of generated version identifiers.
pub const VERSION_FORMAT: &str = "%Y%m%d%H%M%S";

/// Where a recorded statement goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionChoice {
    /// Start a new version named after the current time.
    CreateNewVersion,
    /// Append to the statements of an existing version.
    AppendToVersion(String),
}

/// One batch of caller SQL to apply and record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRequest {
    pub sql: String,
    pub name: Option<String>,
    pub version: VersionChoice,
    /// Unique per logical change. Ignored when appending.
    pub idempotency_key: Option<String>,
}

impl MigrationRequest {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            name: None,
            version: VersionChoice::CreateNewVersion,
            idempotency_key: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn append_to(mut self, version: impl Into<String>) -> Self {
        self.version = VersionChoice::AppendToVersion(version.into());
        self
    }

    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Outcome of a successful [`MigrationTracker::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: String,
    pub appended: bool,
}

/// One row of the history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    pub version: String,
    pub name: Option<String>,
    pub statements: Vec<String>,
    pub created_by: Option<String>,
    pub idempotency_key: Option<String>,
}

/// A migration exported to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub file_name: String,
    pub contents: String,
}

impl MigrationRecord {
    /// Export as `<version>_<name>.sql` (or `<version>.sql` when unnamed).
    pub fn to_migration_file(&self) -> MigrationFile {
        let file_name = match self.name.as_deref().map(file_slug) {
            Some(slug) if !slug.is_empty() => format!("{}_{slug}.sql", self.version),
            _ => format!("{}.sql", self.version),
        };

        let mut contents = String::new();
        for stmt in &self.statements {
            let stmt = stmt.trim();
            if stmt.is_empty() {
                continue;
            }
            if !contents.is_empty() {
                contents.push_str("\n\n");
            }
            contents.push_str(stmt);
            if !stmt.ends_with(';') {
                contents.push(';');
            }
        }
        contents.push('\n');

        MigrationFile {
            file_name,
            contents,
        }
    }
}

fn file_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

/// Deterministic idempotency key for callers with no token of their own.
pub fn idempotency_key_for(sql: &str) -> String {
    blake3::hash(sql.as_bytes()).to_hex().to_string()
}

/// Version identifier for a migration created at `now`.
pub fn version_for(now: DateTime<Utc>) -> String {
    now.format(VERSION_FORMAT).to_string()
}

/// Records applied schema changes into the history table.
#[derive(Debug, Clone)]
pub struct MigrationTracker {
    schema: String,
    table: String,
    created_by: Option<String>,
}

impl Default for MigrationTracker {
    fn default() -> Self {
        Self::new(&MigrationsConfig::default())
    }
}

impl MigrationTracker {
    pub fn new(config: &MigrationsConfig) -> Self {
        Self {
            schema: config.schema().to_string(),
            table: config.table().to_string(),
            created_by: config.created_by.clone(),
        }
    }

    /// `"schema"."table"` of the history table.
    pub fn history_table(&self) -> String {
        quote_qualified(&self.schema, &self.table)
    }

    // ========================================================================
    // Pure text
    // ========================================================================

    /// Statements that create the history table, or bring an older one up
    /// to date. Safe to run any number of times.
    pub fn bootstrap_sql(&self) -> String {
        let schema = pgscribe_sql::quote_ident(&self.schema);
        let table = self.history_table();
        let mut sql = format!(
            "create schema if not exists {schema};\n\
             create table if not exists {table} (version text not null primary key);"
        );
        for column in [
            "statements text[]",
            "name text",
            "created_by text",
            "idempotency_key text unique",
        ] {
            sql.push_str(&format!(
                "\nalter table {table} add column if not exists {column};"
            ));
        }
        sql
    }

    /// Anonymous block that records `request`, if the history table exists.
    pub fn record_sql(&self, request: &MigrationRequest, now: DateTime<Utc>) -> String {
        let statement = DollarQuoted::new(request.sql.as_str()).to_string();
        let record = match &request.version {
            VersionChoice::CreateNewVersion => {
                let insert = render_compact(&self.insert_stmt(request, now, statement));
                match &request.idempotency_key {
                    // A key that is already recorded means this change was
                    // recorded by an earlier attempt.
                    Some(key) => {
                        let seen = SelectStmt::new()
                            .column(SelectColumn::expr(Expr::int(1)))
                            .from(FromClause::table(self.qualified_table()))
                            .where_(
                                Expr::column("idempotency_key".into())
                                    .eq(Expr::string(key.as_str())),
                            );
                        format!(
                            "    if not exists ({}) then\n      {insert};\n    end if;",
                            render_compact(&seen),
                        )
                    }
                    None => format!("    {insert};"),
                }
            }
            VersionChoice::AppendToVersion(version) => {
                let update = UpdateStmt::new(self.qualified_table())
                    .set(
                        "statements".into(),
                        Expr::FnCall {
                            name: "array_append".into(),
                            args: vec![
                                Expr::FnCall {
                                    name: "coalesce".into(),
                                    args: vec![
                                        Expr::column("statements".into()),
                                        Expr::Raw("'{}'".into()),
                                    ],
                                },
                                Expr::Raw(statement),
                            ],
                        },
                    )
                    .where_(Expr::column("version".into()).eq(Expr::string(version.as_str())));
                format!(
                    "    {};\n    if not found then\n      raise exception 'migration version % does not exist', {};\n    end if;",
                    render_compact(&update),
                    Lit(version),
                )
            }
        };

        let body = format!(
            "\nbegin\n  if to_regclass({}) is not null then\n{record}\n  end if;\nend\n",
            Lit(self.history_table()),
        );
        format!("do {};", DollarQuoted::with_prefix("guard", body))
    }

    /// The complete transactional text: bootstrap, the caller's SQL, the
    /// record step, then `commit;`.
    pub fn render_apply(&self, request: &MigrationRequest, now: DateTime<Utc>) -> String {
        wrap_statements(
            &[
                self.bootstrap_sql(),
                request.sql.clone(),
                self.record_sql(request, now),
            ],
            Terminal::Commit,
        )
    }

    fn qualified_table(&self) -> QualifiedTable {
        QualifiedTable::qualified(self.schema.as_str().into(), self.table.as_str().into())
    }

    fn insert_stmt(
        &self,
        request: &MigrationRequest,
        now: DateTime<Utc>,
        statement: String,
    ) -> InsertStmt {
        let optional = |value: Option<&str>| value.map_or(Expr::Null, Expr::string);
        let name = match &request.name {
            Some(name) => Expr::Raw(DollarQuoted::new(name.as_str()).to_string()),
            None => Expr::Null,
        };

        // Inside DO UPDATE, bare names are ambiguous with EXCLUDED.
        let table = self.history_table();
        let current = |column: &str| Expr::Raw(format!("{table}.{}", Ident(column)));
        let keep = |column: &str| Expr::FnCall {
            name: "coalesce".into(),
            args: vec![current(column), Expr::Excluded(column.into())],
        };

        InsertStmt::new(self.qualified_table())
            .columns(
                ["version", "name", "statements", "created_by", "idempotency_key"]
                    .map(ColumnName::from),
            )
            .row(vec![
                Expr::string(version_for(now)),
                name,
                Expr::Array {
                    items: vec![Expr::Raw(statement)],
                    element_type: Some("text".into()),
                },
                optional(self.created_by.as_deref()),
                optional(request.idempotency_key.as_deref()),
            ])
            // Versions have one-second resolution; a second change in the
            // same second joins the version already recorded.
            .on_conflict(OnConflict {
                columns: vec![ColumnName::from("version")],
                action: ConflictAction::DoUpdate(vec![
                    UpdateAssignment::new("name".into(), keep("name")),
                    UpdateAssignment::new(
                        "statements".into(),
                        Expr::FnCall {
                            name: "array_cat".into(),
                            args: vec![
                                Expr::FnCall {
                                    name: "coalesce".into(),
                                    args: vec![current("statements"), Expr::Raw("'{}'".into())],
                                },
                                Expr::Excluded("statements".into()),
                            ],
                        },
                    ),
                    UpdateAssignment::new("idempotency_key".into(), keep("idempotency_key")),
                ]),
            })
    }

    // ========================================================================
    // Live
    // ========================================================================

    /// Create or upgrade the history table outside of any migration.
    pub async fn bootstrap<C: Connection>(&self, conn: &C) -> Result<(), TrackingError> {
        conn.traced()
            .batch_execute(&self.bootstrap_sql())
            .await
            .map_err(TrackingError::bootstrap)
    }

    /// Run `request` and record it, all in one transaction.
    ///
    /// Any failing step rolls the whole transaction back. A failed
    /// bootstrap is reported as [`TrackingError::TrackingBootstrapFailed`];
    /// failures in the caller's SQL or the record step carry the database
    /// message verbatim in [`TrackingError::TransactionAborted`].
    pub async fn apply<C: Connection>(
        &self,
        conn: &C,
        request: &MigrationRequest,
    ) -> Result<AppliedMigration, TrackingError> {
        let now = Utc::now();
        let (version, appended) = match &request.version {
            VersionChoice::CreateNewVersion => (version_for(now), false),
            VersionChoice::AppendToVersion(version) => (version.clone(), true),
        };

        let conn = conn.traced();
        conn.batch_execute("begin").await?;

        if let Err(e) = conn.batch_execute(&self.bootstrap_sql()).await {
            tracing::warn!(error = %db_message(&e), "migration tracking bootstrap failed, rolling back");
            rollback(&conn).await;
            return Err(TrackingError::bootstrap(e));
        }

        if let Err(e) = conn.batch_execute(&request.sql).await {
            tracing::warn!(%version, error = %db_message(&e), "migration failed, rolling back");
            rollback(&conn).await;
            return Err(TrackingError::aborted(e));
        }

        if let Err(e) = conn.batch_execute(&self.record_sql(request, now)).await {
            tracing::warn!(%version, error = %db_message(&e), "recording migration failed, rolling back");
            rollback(&conn).await;
            return Err(TrackingError::aborted(e));
        }

        conn.batch_execute("commit")
            .await
            .map_err(TrackingError::aborted)?;

        tracing::info!(%version, appended, name = ?request.name, "applied migration");
        Ok(AppliedMigration { version, appended })
    }

    /// Highest recorded version, or `None` when there is no history yet.
    pub async fn latest_version<C: Connection>(
        &self,
        conn: &C,
    ) -> Result<Option<String>, TrackingError> {
        if !self.history_exists(conn).await? {
            return Ok(None);
        }
        let sql = format!("select max(version) from {}", self.history_table());
        let rows = conn.traced().query(&sql, &[]).await?;
        match rows.first() {
            Some(row) => Ok(row.try_get(0)?),
            None => Ok(None),
        }
    }

    /// All recorded versions, oldest first.
    pub async fn history<C: Connection>(
        &self,
        conn: &C,
    ) -> Result<Vec<MigrationRecord>, TrackingError> {
        if !self.history_exists(conn).await? {
            return Ok(Vec::new());
        }
        let sql = format!(
            "select version, name, statements, created_by, idempotency_key from {} order by version",
            self.history_table()
        );
        let rows = conn.traced().query(&sql, &[]).await?;
        rows.iter()
            .map(|row| -> Result<MigrationRecord, TrackingError> {
                let statements: Option<Vec<String>> = row.try_get(2)?;
                Ok(MigrationRecord {
                    version: row.try_get(0)?,
                    name: row.try_get(1)?,
                    statements: statements.unwrap_or_default(),
                    created_by: row.try_get(3)?,
                    idempotency_key: row.try_get(4)?,
                })
            })
            .collect()
    }

    async fn history_exists<C: Connection>(&self, conn: &C) -> Result<bool, TrackingError> {
        let table = self.history_table();
        let rows = conn
            .traced()
            .query("select to_regclass($1) is not null", &[&table])
            .await?;
        match rows.first() {
            Some(row) => Ok(row.try_get(0)?),
            None => Ok(false),
        }
    }
}

async fn rollback<C: Connection>(conn: &crate::TracedConn<'_, C>) {
    if let Err(e) = conn.batch_execute("rollback").await {
        tracing::warn!(error = %e, "rollback failed");
    }
}

#[cfg(test)]
mod tests;
