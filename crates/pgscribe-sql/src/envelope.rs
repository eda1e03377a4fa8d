//! Transaction envelopes around statement batches.

/// How a wrapped batch ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// Persist the batch.
    Commit,
    /// Run the batch and throw the results away (preview).
    Rollback,
}

impl Terminal {
    pub fn as_str(self) -> &'static str {
        match self {
            Terminal::Commit => "commit;",
            Terminal::Rollback => "rollback;",
        }
    }
}

/// Wrap `batch` as `begin; <batch> commit;` or `begin; <batch> rollback;`.
///
/// The batch text is embedded unmodified. A `;` is inserted after it when
/// its last statement is not already terminated, so the terminal keyword is
/// always parsed as its own statement.
///
/// # Example
/// ```
/// use pgscribe_sql::{wrap, Terminal};
/// assert_eq!(wrap("select 1;", Terminal::Commit), "begin;\nselect 1;\ncommit;");
/// assert_eq!(wrap("select 1", Terminal::Rollback), "begin;\nselect 1;\nrollback;");
/// ```
pub fn wrap(batch: &str, terminal: Terminal) -> String {
    let mut out = String::with_capacity(batch.len() + 20);
    out.push_str("begin;\n");
    out.push_str(batch);
    push_terminator(&mut out, batch);
    out.push('\n');
    out.push_str(terminal.as_str());
    out
}

/// Wrap several statements, one per line, in a single envelope.
pub fn wrap_statements<S: AsRef<str>>(statements: &[S], terminal: Terminal) -> String {
    let batch = statements
        .iter()
        .map(|s| terminated(s.as_ref()))
        .collect::<Vec<_>>()
        .join("\n");
    wrap(&batch, terminal)
}

/// `wrap(batch, Terminal::Commit)`.
pub fn wrap_commit(batch: &str) -> String {
    wrap(batch, Terminal::Commit)
}

/// `wrap(batch, Terminal::Rollback)`.
pub fn wrap_rollback(batch: &str) -> String {
    wrap(batch, Terminal::Rollback)
}

fn terminated(stmt: &str) -> String {
    let mut out = stmt.to_string();
    push_terminator(&mut out, stmt);
    out
}

fn push_terminator(out: &mut String, sql: &str) {
    let trimmed = sql.trim_end();
    let last_line = trimmed.rsplit('\n').next().unwrap_or_default();
    if last_line.contains("--") {
        // A trailing line comment would swallow a `;` on the same line.
        out.push_str("\n;");
    } else if !trimmed.is_empty() && !trimmed.ends_with(';') {
        out.push(';');
    }
}
