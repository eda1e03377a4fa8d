//! Table descriptors and the structured inputs statements are built from.
//!
//! A [`TableDescriptor`] is what the caller knows about a table (usually
//! from catalog introspection). Filters, sorts and row payloads describe one
//! statement against it. Nothing here renders SQL except type names.

use std::fmt;

use pgscribe_sql::{quote_ident, quote_qualified};

mod filter;
pub use filter::*;

mod payload;
pub use payload::*;

/// Postgres column data type categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    /// SMALLINT (2 bytes)
    SmallInt,
    /// INTEGER (4 bytes)
    Integer,
    /// BIGINT (8 bytes)
    BigInt,
    /// REAL (4 bytes floating point)
    Real,
    /// DOUBLE PRECISION (8 bytes floating point)
    DoublePrecision,
    /// NUMERIC (arbitrary precision)
    Numeric,
    /// BOOLEAN
    Boolean,
    /// TEXT / VARCHAR
    Text,
    /// BYTEA (binary)
    Bytea,
    /// TIMESTAMPTZ
    Timestamptz,
    /// TIMESTAMP (without time zone)
    Timestamp,
    /// DATE
    Date,
    /// TIME
    Time,
    /// UUID
    Uuid,
    /// JSON
    Json,
    /// JSONB
    Jsonb,
    /// A range type such as INT4RANGE or TSTZRANGE
    Range(String),
    /// A user-defined enum type
    Enum { schema: String, name: String },
    /// An array of another type
    Array(Box<DataType>),
    /// Anything else, spelled the way the catalog reports it
    Other(String),
}

impl DataType {
    /// Build an enum type reference.
    pub fn enumeration(schema: impl Into<String>, name: impl Into<String>) -> Self {
        DataType::Enum {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Build an array of `element`.
    pub fn array_of(element: DataType) -> Self {
        DataType::Array(Box::new(element))
    }

    /// The element type if this is an array.
    pub fn element(&self) -> Option<&DataType> {
        match self {
            DataType::Array(inner) => Some(inner),
            _ => None,
        }
    }

    /// Whether this is an array of a user-defined enum.
    pub fn is_enum_array(&self) -> bool {
        matches!(self.element(), Some(DataType::Enum { .. }))
    }

    pub fn is_json(&self) -> bool {
        matches!(self, DataType::Json | DataType::Jsonb)
    }

    /// SQL spelling of this type, suitable after `::`.
    ///
    /// Enum types are quoted, and schema-qualified when they have a schema;
    /// built-in types are not.
    pub fn sql(&self) -> String {
        match self {
            DataType::SmallInt => "smallint".into(),
            DataType::Integer => "integer".into(),
            DataType::BigInt => "bigint".into(),
            DataType::Real => "real".into(),
            DataType::DoublePrecision => "double precision".into(),
            DataType::Numeric => "numeric".into(),
            DataType::Boolean => "boolean".into(),
            DataType::Text => "text".into(),
            DataType::Bytea => "bytea".into(),
            DataType::Timestamptz => "timestamptz".into(),
            DataType::Timestamp => "timestamp".into(),
            DataType::Date => "date".into(),
            DataType::Time => "time".into(),
            DataType::Uuid => "uuid".into(),
            DataType::Json => "json".into(),
            DataType::Jsonb => "jsonb".into(),
            DataType::Range(name) | DataType::Other(name) => name.clone(),
            // Unqualified resolves through the search path.
            DataType::Enum { schema, name } if schema.is_empty() => quote_ident(name),
            DataType::Enum { schema, name } => quote_qualified(schema, name),
            DataType::Array(inner) => format!("{}[]", inner.sql()),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql())
    }
}

/// How an identity column generates values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// GENERATED ALWAYS AS IDENTITY
    Always,
    /// GENERATED BY DEFAULT AS IDENTITY
    ByDefault,
}

/// A foreign key reference from one column to another table's column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForeignKeyRef {
    pub schema: String,
    pub table: String,
    pub column: String,
}

/// A database column definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Data type category
    pub data_type: DataType,
    /// Whether the column allows NULL
    pub nullable: bool,
    /// Identity generation, if this is an identity column
    pub identity: Option<Identity>,
    /// Whether this is a GENERATED ... STORED column
    pub generated: bool,
    /// Default value expression (if any)
    pub default: Option<String>,
    /// Enum values, if the column (or its element type) is an enum
    pub enum_values: Vec<String>,
    /// Foreign key reference (if any)
    pub foreign_key: Option<ForeignKeyRef>,
    /// Whether this is part of the primary key
    pub primary_key: bool,
    /// Whether this has a unique constraint
    pub unique: bool,
}

impl Column {
    /// A nullable column with no constraints.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            identity: None,
            generated: false,
            default: None,
            enum_values: Vec::new(),
            foreign_key: None,
            primary_key: false,
            unique: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self.nullable = false;
        self
    }

    pub fn generated(mut self) -> Self {
        self.generated = true;
        self
    }

    pub fn default_expr(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    pub fn enum_values(mut self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn references(
        mut self,
        schema: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        self.foreign_key = Some(ForeignKeyRef {
            schema: schema.into(),
            table: table.into(),
            column: column.into(),
        });
        self
    }

    /// Whether values for this column are produced by the database.
    pub fn is_generated(&self) -> bool {
        self.generated || self.identity.is_some()
    }
}

/// Everything a statement needs to know about one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescriptor {
    /// Schema name
    pub schema: String,
    /// Table name
    pub name: String,
    /// Columns in ordinal order
    pub columns: Vec<Column>,
}

impl TableDescriptor {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    pub fn unique_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.unique)
    }

    pub fn enum_array_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.data_type.is_enum_array())
    }

    /// `"schema"."table"`
    pub fn qualified_name(&self) -> String {
        quote_qualified(&self.schema, &self.name)
    }
}
