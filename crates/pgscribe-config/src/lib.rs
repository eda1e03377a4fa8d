//! Configuration schema for pgscribe.
//!
//! Every field is optional in the file; accessors resolve the defaults.
//! Components receive the section they need at construction time.
//!
//! ```styx
//! migrations {schema supabase_migrations, created_by studio}
//! entities {disabled (cron)}
//! statements {require_filter_for_mutations true}
//! analytics {default_limit 100, max_limit 1000}
//! ```

use facet::Facet;

/// Default schema holding the migration history table.
pub const DEFAULT_TRACKING_SCHEMA: &str = "supabase_migrations";

/// Default name of the migration history table.
pub const DEFAULT_TRACKING_TABLE: &str = "schema_migrations";

/// Root of `.config/pgscribe.styx`.
#[derive(Debug, Clone, Default, Facet)]
pub struct Config {
    /// Migration history tracking.
    #[facet(default)]
    pub migrations: Option<MigrationsConfig>,

    /// Which entity kinds the invalidation classifier reports.
    #[facet(default)]
    pub entities: Option<EntitiesConfig>,

    /// Statement generation.
    #[facet(default)]
    pub statements: Option<StatementsConfig>,

    /// Log analytics queries.
    #[facet(default)]
    pub analytics: Option<AnalyticsConfig>,
}

impl Config {
    pub fn migrations(&self) -> MigrationsConfig {
        self.migrations.clone().unwrap_or_default()
    }

    pub fn entities(&self) -> EntitiesConfig {
        self.entities.clone().unwrap_or_default()
    }

    pub fn statements(&self) -> StatementsConfig {
        self.statements.clone().unwrap_or_default()
    }

    pub fn analytics(&self) -> AnalyticsConfig {
        self.analytics.clone().unwrap_or_default()
    }
}

/// Migration history tracking.
#[derive(Debug, Clone, Default, Facet)]
pub struct MigrationsConfig {
    /// Schema for the history table (default `supabase_migrations`).
    #[facet(default)]
    pub schema: Option<String>,

    /// History table name (default `schema_migrations`).
    #[facet(default)]
    pub table: Option<String>,

    /// Recorded in the `created_by` column of new versions.
    #[facet(default)]
    pub created_by: Option<String>,
}

impl MigrationsConfig {
    pub fn schema(&self) -> &str {
        self.schema.as_deref().unwrap_or(DEFAULT_TRACKING_SCHEMA)
    }

    pub fn table(&self) -> &str {
        self.table.as_deref().unwrap_or(DEFAULT_TRACKING_TABLE)
    }
}

/// Entity classification.
#[derive(Debug, Clone, Default, Facet)]
pub struct EntitiesConfig {
    /// Entity kinds that are never reported (e.g. `cron` when the
    /// scheduler extension is unavailable).
    #[facet(default)]
    pub disabled: Vec<String>,
}

impl EntitiesConfig {
    pub fn is_disabled(&self, kind: &str) -> bool {
        self.disabled.iter().any(|d| d.eq_ignore_ascii_case(kind))
    }
}

/// Statement generation.
#[derive(Debug, Clone, Default, Facet)]
pub struct StatementsConfig {
    /// Refuse to build UPDATE/DELETE statements without a filter.
    #[facet(default)]
    pub require_filter_for_mutations: Option<bool>,
}

impl StatementsConfig {
    pub fn require_filter_for_mutations(&self) -> bool {
        self.require_filter_for_mutations.unwrap_or(false)
    }
}

/// Log analytics queries.
#[derive(Debug, Clone, Default, Facet)]
pub struct AnalyticsConfig {
    /// Row limit when the caller does not give one (default 100).
    #[facet(default)]
    pub default_limit: Option<u32>,

    /// Upper bound for any row limit (default 1000).
    #[facet(default)]
    pub max_limit: Option<u32>,
}

impl AnalyticsConfig {
    pub fn default_limit(&self) -> u32 {
        self.default_limit.unwrap_or(100).min(self.max_limit())
    }

    pub fn max_limit(&self) -> u32 {
        self.max_limit.unwrap_or(1000).max(1)
    }
}
