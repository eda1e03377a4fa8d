//! The ordered rule table behind [`super::EntityExtractor`].

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{EntityType, InvalidationEvent};

pub(super) struct Rule {
    pub kind: EntityType,
    pub extract: fn(&str) -> Option<InvalidationEvent>,
}

/// Tried top to bottom; the first match wins.
///
/// Every DDL rule is anchored on its leading verb and object keyword, so
/// they never overlap. Cron is last because a scheduler call can appear
/// inside the body of any other statement.
pub(super) const RULES: &[Rule] = &[
    Rule {
        kind: EntityType::Table,
        extract: table,
    },
    Rule {
        kind: EntityType::Function,
        extract: function,
    },
    Rule {
        kind: EntityType::Trigger,
        extract: trigger,
    },
    Rule {
        kind: EntityType::Policy,
        extract: policy,
    },
    Rule {
        kind: EntityType::Index,
        extract: index,
    },
    Rule {
        kind: EntityType::View,
        extract: view,
    },
    Rule {
        kind: EntityType::Schema,
        extract: schema,
    },
    Rule {
        kind: EntityType::Cron,
        extract: cron,
    },
];

// ============================================================================
// Pattern pieces
// ============================================================================

/// A quoted identifier (with `""` escapes) or a bare one.
const IDENT: &str = r#"(?:"(?:[^"]|"")+"|[A-Za-z_][A-Za-z0-9_$]*)"#;

/// `[schema.]name`
const QNAME: &str = r"(?:(?P<schema>%ID%)\s*\.\s*)?(?P<name>%ID%)";

/// `[schema.]table` of an `on` clause
const TABLE_REF: &str = r"(?:only\s+)?(?:(?P<tschema>%ID%)\s*\.\s*)?(?P<table>%ID%)";

fn compile(pattern: &str) -> Regex {
    Regex::new(&pattern.replace("%ID%", IDENT)).expect("entity patterns are valid")
}

/// Strip whitespace and comments in front of the first keyword.
pub(super) fn strip_leading_noise(sql: &str) -> &str {
    static NOISE: LazyLock<Regex> =
        LazyLock::new(|| compile(r"^(?:\s+|--[^\n]*|(?s:/\*.*?\*/))*"));
    match NOISE.find(sql) {
        Some(m) => &sql[m.end()..],
        None => sql,
    }
}

/// Quoted identifiers lose their quotes; bare ones fold to lower case.
fn unquote(ident: &str) -> String {
    match ident.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => ident.to_lowercase(),
    }
}

fn ident(caps: &Captures<'_>, group: &str) -> Option<String> {
    caps.name(group).map(|m| unquote(m.as_str()))
}

/// Event for an entity attached to a table (trigger, policy, index).
fn on_table(kind: EntityType, caps: &Captures<'_>, name: String) -> Option<InvalidationEvent> {
    let table = ident(caps, "table")?;
    Some(InvalidationEvent::new(kind, ident(caps, "tschema"), name).with_table(table))
}

// ============================================================================
// Rules
// ============================================================================

fn cron(sql: &str) -> Option<InvalidationEvent> {
    static CALL: LazyLock<Regex> = LazyLock::new(|| {
        compile(r"(?is)\bcron\s*\.\s*(?P<func>schedule_in_database|schedule|unschedule)\s*\(")
    });

    let caps = CALL.captures(sql)?;
    let open = caps.get(0)?.end();
    let args = call_args(&sql[open..])?;

    let needed = if caps["func"].eq_ignore_ascii_case("unschedule") {
        1
    } else {
        // The two-argument form schedules an unnamed job.
        3
    };
    if args.len() < needed {
        return None;
    }
    let name = string_literal(args[0])?;
    Some(InvalidationEvent::new(EntityType::Cron, None, name))
}

/// Top-level arguments of a call, given the text after its `(`.
///
/// Quoted strings, quoted identifiers, dollar-quoted bodies and nested
/// parentheses are skipped whole. `None` if the call is never closed.
fn call_args(rest: &str) -> Option<Vec<&str>> {
    static DOLLAR_TAG: LazyLock<Regex> =
        LazyLock::new(|| compile(r"^\$(?:[A-Za-z_][A-Za-z0-9_]*)?\$"));

    let bytes = rest.as_bytes();
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                i += 1;
                loop {
                    match bytes.get(i) {
                        None => return None,
                        Some(&b) if b == quote && bytes.get(i + 1) == Some(&quote) => i += 2,
                        Some(&b) if b == quote => break,
                        Some(_) => i += 1,
                    }
                }
            }
            b'$' => {
                if let Some(tag) = DOLLAR_TAG.find(&rest[i..]) {
                    let body = i + tag.end();
                    let close = rest[body..].find(tag.as_str())?;
                    i = body + close + tag.len() - 1;
                }
            }
            b'(' => depth += 1,
            b')' if depth > 0 => depth -= 1,
            b')' => {
                args.push(rest[start..i].trim());
                if args.len() == 1 && args[0].is_empty() {
                    args.clear();
                }
                return Some(args);
            }
            b',' if depth == 0 => {
                args.push(rest[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// The text of a lone single-quoted literal.
fn string_literal(arg: &str) -> Option<String> {
    let inner = arg.strip_prefix('\'')?.strip_suffix('\'')?;
    if inner.replace("''", "").contains('\'') {
        return None;
    }
    Some(inner.replace("''", "'"))
}

fn trigger(sql: &str) -> Option<InvalidationEvent> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        compile(&format!(
            r"(?is)^(?:create\s+(?:or\s+replace\s+)?(?:constraint\s+)?|alter\s+|drop\s+)trigger\s+(?:if\s+exists\s+)?(?P<name>%ID%).*?\s+on\s+{TABLE_REF}"
        ))
    });
    let caps = RE.captures(sql)?;
    on_table(EntityType::Trigger, &caps, ident(&caps, "name")?)
}

fn policy(sql: &str) -> Option<InvalidationEvent> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        compile(&format!(
            r"(?is)^(?:create|alter|drop)\s+policy\s+(?:if\s+exists\s+)?(?P<name>%ID%)\s+on\s+{TABLE_REF}"
        ))
    });
    let caps = RE.captures(sql)?;
    on_table(EntityType::Policy, &caps, ident(&caps, "name")?)
}

fn index(sql: &str) -> Option<InvalidationEvent> {
    static CREATE: LazyLock<Regex> = LazyLock::new(|| {
        compile(&format!(
            r"(?is)^create\s+(?:unique\s+)?index\s+(?:concurrently\s+)?(?:if\s+not\s+exists\s+)?(?:(?P<name>%ID%)\s+)?on\s+{TABLE_REF}"
        ))
    });
    static OTHER: LazyLock<Regex> = LazyLock::new(|| {
        compile(&format!(
            r"(?is)^(?:alter|drop)\s+index\s+(?:concurrently\s+)?(?:if\s+exists\s+)?{QNAME}"
        ))
    });

    if let Some(caps) = CREATE.captures(sql) {
        // Unnamed indexes are reported under their table.
        let name = ident(&caps, "name").or_else(|| ident(&caps, "table"))?;
        return on_table(EntityType::Index, &caps, name);
    }
    let caps = OTHER.captures(sql)?;
    Some(InvalidationEvent::new(
        EntityType::Index,
        ident(&caps, "schema"),
        ident(&caps, "name")?,
    ))
}

fn view(sql: &str) -> Option<InvalidationEvent> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        compile(&format!(
            r"(?is)^(?:create\s+(?:or\s+replace\s+)?(?:(?:temp|temporary)\s+)?(?:recursive\s+)?(?:materialized\s+)?|alter\s+(?:materialized\s+)?|drop\s+(?:materialized\s+)?|refresh\s+materialized\s+)view\s+(?:if\s+(?:not\s+)?exists\s+)?(?:concurrently\s+)?{QNAME}"
        ))
    });
    let caps = RE.captures(sql)?;
    Some(InvalidationEvent::new(
        EntityType::View,
        ident(&caps, "schema"),
        ident(&caps, "name")?,
    ))
}

fn function(sql: &str) -> Option<InvalidationEvent> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        compile(&format!(
            r"(?is)^(?:create\s+(?:or\s+replace\s+)?|alter\s+|drop\s+)(?:function|procedure)\s+(?:if\s+exists\s+)?{QNAME}"
        ))
    });
    let caps = RE.captures(sql)?;
    Some(InvalidationEvent::new(
        EntityType::Function,
        ident(&caps, "schema"),
        ident(&caps, "name")?,
    ))
}

fn table(sql: &str) -> Option<InvalidationEvent> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        compile(&format!(
            r"(?is)^(?:create\s+(?:(?:global|local)\s+)?(?:(?:temp|temporary|unlogged)\s+)?|alter\s+|drop\s+|comment\s+on\s+)table\s+(?:if\s+(?:not\s+)?exists\s+)?(?:only\s+)?{QNAME}"
        ))
    });
    let caps = RE.captures(sql)?;
    let name = ident(&caps, "name")?;
    let event = InvalidationEvent::new(EntityType::Table, ident(&caps, "schema"), name.clone());
    Some(event.with_table(name))
}

fn schema(sql: &str) -> Option<InvalidationEvent> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        compile(r"(?is)^(?:create|alter|drop)\s+schema\s+(?:if\s+(?:not\s+)?exists\s+)?(?P<name>%ID%)")
    });
    let caps = RE.captures(sql)?;
    let name = ident(&caps, "name")?;
    Some(InvalidationEvent::new(EntityType::Schema, Some(name.clone()), name))
}
