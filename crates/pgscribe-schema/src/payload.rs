//! Values and row payloads.

use indexmap::{IndexMap, IndexSet};

use crate::TableDescriptor;

/// A value destined for a statement, before it is turned into a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// JSON document text, rendered as a `jsonb` literal
    Json(String),
    Array(Vec<Value>),
    /// The DEFAULT keyword
    Default,
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

/// Column name to value, in insertion order.
///
/// Columns flagged as enum arrays get a typed `ARRAY[...]::type[]` literal
/// instead of a plain one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPayload {
    values: IndexMap<String, Value>,
    enum_arrays: IndexSet<String>,
}

impl RowPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value, replacing any previous value for that column.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// Flag `column` as an enum array.
    pub fn enum_array(mut self, column: impl Into<String>) -> Self {
        self.enum_arrays.insert(column.into());
        self
    }

    /// Flag every payload column that the table declares as an enum array.
    pub fn flag_enum_arrays(mut self, table: &TableDescriptor) -> Self {
        for column in table.enum_array_columns() {
            if self.values.contains_key(&column.name) {
                self.enum_arrays.insert(column.name.clone());
            }
        }
        self
    }

    pub fn is_enum_array(&self, column: &str) -> bool {
        self.enum_arrays.contains(column)
    }

    pub fn enum_array_columns(&self) -> impl Iterator<Item = &str> {
        self.enum_arrays.iter().map(String::as_str)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RowPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = RowPayload::new();
        for (k, v) in iter {
            payload = payload.set(k, v);
        }
        payload
    }
}
