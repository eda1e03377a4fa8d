//! Dollar-quoted string literals.

use std::fmt;

/// A dollar-quoted literal: `$tag$body$tag$`.
///
/// The tag is random and guaranteed not to occur inside the body, so the
/// body can contain quotes, semicolons or other dollar-quoted strings
/// without terminating the literal early.
///
/// # Example
/// ```
/// use pgscribe_sql::DollarQuoted;
/// let q = DollarQuoted::new("select 'it''s';");
/// let rendered = q.to_string();
/// assert!(rendered.starts_with(&format!("${}$", q.tag())));
/// assert!(rendered.ends_with(&format!("${}$", q.tag())));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DollarQuoted {
    tag: String,
    body: String,
}

impl DollarQuoted {
    /// Quote `body` with a fresh random tag.
    pub fn new(body: impl Into<String>) -> Self {
        Self::with_prefix("pgs", body)
    }

    /// Quote `body` with a fresh random tag starting with `prefix`.
    ///
    /// `prefix` must be a plain lowercase identifier (letters, digits, `_`).
    pub fn with_prefix(prefix: &str, body: impl Into<String>) -> Self {
        let body = body.into();
        loop {
            let tag = random_tag(prefix);
            if !body.contains(&format!("${tag}$")) {
                return Self { tag, body };
            }
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

impl fmt::Display for DollarQuoted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = &self.tag;
        write!(f, "${tag}${}${tag}$", self.body)
    }
}

fn random_tag(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &id[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_never_occurs_in_body() {
        let q = DollarQuoted::new("a $b$ c");
        assert!(!q.body().contains(&format!("${}$", q.tag())));
    }

    #[test]
    fn renders_body_verbatim() {
        let body = "create function f() returns int as $$ select 1 $$ language sql;";
        let q = DollarQuoted::new(body);
        let rendered = q.to_string();
        let open = format!("${}$", q.tag());
        assert_eq!(rendered, format!("{open}{body}{open}"));
    }

    #[test]
    fn prefix_is_kept() {
        let q = DollarQuoted::with_prefix("name", "x");
        assert!(q.tag().starts_with("name_"));
    }

    #[test]
    fn tags_are_fresh() {
        let a = DollarQuoted::new("x");
        let b = DollarQuoted::new("x");
        assert_ne!(a.tag(), b.tag());
    }
}
