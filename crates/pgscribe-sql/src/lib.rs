//! SQL AST, rendering and quoting primitives.
//!
//! Build SQL as a typed AST, then render it to a string. Every identifier
//! that reaches the output goes through [`Ident`] and every string literal
//! through [`Lit`], so there is exactly one place where quoting happens.

use strid::braid;

mod dollar;
pub use dollar::*;

mod envelope;
pub use envelope::*;

mod expr;
pub use expr::*;

mod render;
pub use render::*;

mod stmt;
pub use stmt::*;

/// The name of a schema.
#[braid]
pub struct SchemaName;

/// The name of a table (or table alias).
#[braid]
pub struct TableName;

/// The name of a column (or column alias).
#[braid]
pub struct ColumnName;

/// A PostgreSQL string literal wrapper.
///
/// Display writes the value escaped and quoted with single quotes.
///
/// # Example
/// ```
/// use pgscribe_sql::Lit;
/// assert_eq!(format!("{}", Lit("foo")), "'foo'");
/// assert_eq!(format!("{}", Lit("it's")), "'it''s'");
/// ```
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'")?;
        for c in self.0.as_ref().chars() {
            if c == '\'' {
                write!(f, "''")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "'")
    }
}

/// A PostgreSQL identifier wrapper.
///
/// Display writes the value escaped and quoted with double quotes.
///
/// # Example
/// ```
/// use pgscribe_sql::Ident;
/// assert_eq!(format!("{}", Ident("user")), "\"user\"");
/// assert_eq!(format!("{}", Ident("bla\"h")), "\"bla\"\"h\"");
/// ```
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"")?;
        for c in self.0.as_ref().chars() {
            if c == '"' {
                write!(f, "\"\"")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "\"")
    }
}

/// Double every single quote in `s`, without surrounding quotes.
///
/// Total and pure: a string with n single quotes maps to one with 2n, and the
/// empty string maps to itself.
///
/// # Example
/// ```
/// use pgscribe_sql::escape_literal;
/// assert_eq!(escape_literal("it's a 'test'"), "it''s a ''test''");
/// assert_eq!(escape_literal(""), "");
/// ```
pub fn escape_literal(s: &str) -> String {
    s.replace('\'', "''")
}

/// Escape and quote a string literal for SQL.
pub fn escape_string(s: &str) -> String {
    format!("{}", Lit(s))
}

/// Quote a PostgreSQL identifier.
///
/// Always quotes identifiers to avoid issues with reserved keywords like
/// `user`, `order`, `table`, `group`, etc. Doubles any embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("{}", Ident(name))
}

/// Quote a schema-qualified name: `"schema"."name"`.
///
/// # Example
/// ```
/// use pgscribe_sql::quote_qualified;
/// assert_eq!(quote_qualified("public", "users"), r#""public"."users""#);
/// ```
pub fn quote_qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", Ident(schema), Ident(name))
}
