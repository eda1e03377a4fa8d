//! Caller filters over the common log row shape.
//!
//! This is where caller text meets query text, so every value is checked
//! before it is quoted: backslashes and control characters are refused
//! outright, single quotes are doubled.

use std::fmt;
use std::str::FromStr;

use pgscribe_sql::Lit;

use crate::AnalyticsError;

/// A column of the unified log projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogField {
    Id,
    LogType,
    Status,
    Level,
    Pathname,
    EventMessage,
    Method,
}

impl LogField {
    pub const ALL: [LogField; 7] = [
        LogField::Id,
        LogField::LogType,
        LogField::Status,
        LogField::Level,
        LogField::Pathname,
        LogField::EventMessage,
        LogField::Method,
    ];

    /// Dimensions reported by the facet counts.
    pub const FACETS: [LogField; 5] = [
        LogField::LogType,
        LogField::Method,
        LogField::Level,
        LogField::Status,
        LogField::Pathname,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogField::Id => "id",
            LogField::LogType => "log_type",
            LogField::Status => "status",
            LogField::Level => "level",
            LogField::Pathname => "pathname",
            LogField::EventMessage => "event_message",
            LogField::Method => "method",
        }
    }
}

impl fmt::Display for LogField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogField {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| AnalyticsError::UnknownField(s.to_string()))
    }
}

/// How a field is compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFilterOp {
    Eq(String),
    /// Any of the values; an empty list matches nothing
    In(Vec<String>),
    /// Substring match
    Contains(String),
}

/// One condition of a log query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub field: LogField,
    pub op: LogFilterOp,
}

impl LogFilter {
    pub fn eq(field: LogField, value: impl Into<String>) -> Self {
        Self {
            field,
            op: LogFilterOp::Eq(value.into()),
        }
    }

    pub fn any_of(field: LogField, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            field,
            op: LogFilterOp::In(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn contains(field: LogField, value: impl Into<String>) -> Self {
        Self {
            field,
            op: LogFilterOp::Contains(value.into()),
        }
    }

    /// Build a filter from an untrusted field name.
    pub fn parse(field: &str, op: LogFilterOp) -> Result<Self, AnalyticsError> {
        Ok(Self {
            field: field.parse()?,
            op,
        })
    }

    /// The condition text, after checking every value.
    pub(super) fn condition(&self) -> Result<String, AnalyticsError> {
        let field = self.field.as_str();
        let cond = match &self.op {
            LogFilterOp::Eq(value) => {
                let value = checked(self.field, value)?;
                format!("{field} = {}", Lit(value))
            }
            LogFilterOp::In(values) if values.is_empty() => "FALSE".to_string(),
            LogFilterOp::In(values) => {
                let items = values
                    .iter()
                    .map(|v| checked(self.field, v).map(|v| Lit(v).to_string()))
                    .collect::<Result<Vec<_>, _>>()?;
                format!("{field} IN ({})", items.join(", "))
            }
            LogFilterOp::Contains(value) => {
                let value = checked(self.field, value)?;
                // `%` and `_` in the value are plain text.
                format!("STRPOS({field}, {}) > 0", Lit(value))
            }
        };
        Ok(cond)
    }
}

fn checked(field: LogField, value: &str) -> Result<&str, AnalyticsError> {
    let reject = |reason: &str| AnalyticsError::InjectionRisk {
        field: field.to_string(),
        reason: reason.to_string(),
    };
    if value.contains('\\') {
        return Err(reject("backslashes are not allowed in filter values"));
    }
    if value.chars().any(char::is_control) {
        return Err(reject("control characters are not allowed in filter values"));
    }
    Ok(value)
}

/// `WHERE a AND b`, or nothing when there are no conditions.
pub(super) fn where_clause<'f>(
    filters: impl IntoIterator<Item = &'f LogFilter>,
    extra: &[String],
) -> Result<String, AnalyticsError> {
    let mut conditions = filters
        .into_iter()
        .map(LogFilter::condition)
        .collect::<Result<Vec<_>, _>>()?;
    conditions.extend(extra.iter().cloned());
    if conditions.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!("WHERE {}", conditions.join(" AND ")))
    }
}
