//! Classify executed SQL into the schema entity it touched.
//!
//! This is a heuristic, not a parser: each rule looks at the leading verb
//! of the statement (or, for cron jobs, a scheduler call anywhere in it)
//! and pulls out an optional schema qualifier and a name. Rules are tried
//! in a fixed order and the first match wins. Anything unrecognised is a
//! miss (`None`), which upstream turns into a coarser invalidation.
//!
//! ```
//! use pgscribe::entity::{EntityExtractor, EntityType};
//!
//! let event = EntityExtractor::default()
//!     .extract("create table if not exists public.widgets (id int)")
//!     .unwrap();
//! assert_eq!(event.entity_type, EntityType::Table);
//! assert_eq!(event.table.as_deref(), Some("widgets"));
//! ```

use std::fmt;

use pgscribe_config::EntitiesConfig;

mod rules;
use rules::{RULES, strip_leading_noise};

/// Schema assumed when a name carries no qualifier.
pub const DEFAULT_SCHEMA: &str = "public";

/// Kind of schema entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Table,
    /// Functions and procedures
    Function,
    Trigger,
    Policy,
    Index,
    Cron,
    View,
    Schema,
}

impl EntityType {
    pub const ALL: [EntityType; 8] = [
        EntityType::Table,
        EntityType::Function,
        EntityType::Trigger,
        EntityType::Policy,
        EntityType::Index,
        EntityType::Cron,
        EntityType::View,
        EntityType::Schema,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Table => "table",
            EntityType::Function => "function",
            EntityType::Trigger => "trigger",
            EntityType::Policy => "policy",
            EntityType::Index => "index",
            EntityType::Cron => "cron",
            EntityType::View => "view",
            EntityType::Schema => "schema",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which cached results a statement made stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationEvent {
    pub entity_type: EntityType,
    pub schema: String,
    /// The table the entity belongs to (tables, triggers, policies, indexes)
    pub table: Option<String>,
    pub entity_name: String,
}

impl InvalidationEvent {
    pub fn new(entity_type: EntityType, schema: Option<String>, entity_name: String) -> Self {
        Self {
            entity_type,
            schema: schema.unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
            table: None,
            entity_name,
        }
    }

    pub fn with_table(mut self, table: String) -> Self {
        self.table = Some(table);
        self
    }
}

/// Turns raw SQL into at most one [`InvalidationEvent`].
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    enabled: Vec<EntityType>,
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new(&EntitiesConfig::default())
    }
}

impl EntityExtractor {
    pub fn new(config: &EntitiesConfig) -> Self {
        let enabled = EntityType::ALL
            .into_iter()
            .filter(|kind| !config.is_disabled(kind.as_str()))
            .collect();
        Self { enabled }
    }

    pub fn is_enabled(&self, kind: EntityType) -> bool {
        self.enabled.contains(&kind)
    }

    /// Classify one statement. Never fails; `None` means "don't know".
    pub fn extract(&self, sql: &str) -> Option<InvalidationEvent> {
        let sql = strip_leading_noise(sql);
        for rule in RULES {
            if !self.is_enabled(rule.kind) {
                continue;
            }
            if let Some(event) = (rule.extract)(sql) {
                return Some(event);
            }
        }
        tracing::trace!(sql = %sql, "no entity recognised");
        None
    }
}

/// [`EntityExtractor::extract`] with every kind enabled.
pub fn extract_entity(sql: &str) -> Option<InvalidationEvent> {
    EntityExtractor::default().extract(sql)
}

#[cfg(test)]
mod tests;
