//! Render SQL AST to string.

use std::fmt;

use crate::expr::{ColumnRef, Expr};
use crate::stmt::*;
use crate::{Ident, Lit};

/// How clauses are separated in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// One clause per line.
    #[default]
    Pretty,
    /// Everything on one line, for embedding in larger batches.
    Compact,
}

/// Rendering context.
pub struct RenderContext {
    layout: Layout,
}

impl RenderContext {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// Separator placed before each top-level clause.
    fn sep(&self) -> &'static str {
        match self.layout {
            Layout::Pretty => "\n",
            Layout::Compact => " ",
        }
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(Layout::default())
    }
}

/// Wrapper for rendering a `Render` type via `Display`.
///
/// Allows using `write!(f, "{}", Fmt(ctx, &expr))` in format strings.
pub struct Fmt<'a, T: Render>(
    /// The rendering context.
    &'a RenderContext,
    /// The value to render.
    &'a T,
);

impl<T: Render> fmt::Display for Fmt<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.1.render(self.0, f)
    }
}

// ============================================================================
// Render implementations
// ============================================================================

/// Trait for types that can be rendered to SQL.
pub trait Render {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

fn comma_list<T: Render>(
    ctx: &RenderContext,
    f: &mut fmt::Formatter<'_>,
    items: &[T],
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", Fmt(ctx, item))?;
    }
    Ok(())
}

impl Render for Expr {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(col) => col.render(ctx, f),
            Expr::String(s) => write!(f, "{}", Lit(s)),
            Expr::Int(n) => write!(f, "{n}"),
            Expr::Float(n) if n.is_finite() => write!(f, "{n}"),
            // NaN and the infinities have no numeric literal form
            Expr::Float(n) => write!(f, "'{n}'::float8"),
            Expr::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Expr::Null => write!(f, "NULL"),
            Expr::Default => write!(f, "DEFAULT"),
            Expr::BinOp { left, op, right } => {
                let left = Fmt(ctx, left.as_ref());
                let right = Fmt(ctx, right.as_ref());
                let op = op.as_str();
                write!(f, "{left} {op} {right}")
            }
            Expr::Is { expr, test } => {
                let expr = Fmt(ctx, expr.as_ref());
                let test = test.as_str();
                write!(f, "{expr} {test}")
            }
            Expr::InList { expr, items } => {
                let expr = Fmt(ctx, expr.as_ref());
                write!(f, "{expr} IN (")?;
                comma_list(ctx, f, items)?;
                write!(f, ")")
            }
            Expr::Array {
                items,
                element_type,
            } => match element_type {
                Some(ty) => {
                    write!(f, "ARRAY[")?;
                    comma_list(ctx, f, items)?;
                    write!(f, "]::{ty}[]")
                }
                // ARRAY[] needs a type; let the target column decide instead
                None if items.is_empty() => write!(f, "'{{}}'"),
                None => {
                    write!(f, "ARRAY[")?;
                    comma_list(ctx, f, items)?;
                    write!(f, "]")
                }
            },
            Expr::Cast { expr, ty } => {
                let expr = Fmt(ctx, expr.as_ref());
                write!(f, "{expr}::{ty}")
            }
            Expr::Row(items) => {
                write!(f, "(")?;
                comma_list(ctx, f, items)?;
                write!(f, ")")
            }
            Expr::Excluded(col) => {
                let col = Ident(col.as_str());
                write!(f, "EXCLUDED.{col}")
            }
            Expr::FnCall { name, args } => {
                write!(f, "{name}(")?;
                comma_list(ctx, f, args)?;
                write!(f, ")")
            }
            Expr::CountStar => write!(f, "COUNT(*)"),
            Expr::Group(inner) => {
                let inner = Fmt(ctx, inner.as_ref());
                write!(f, "({inner})")
            }
            Expr::Raw(s) => write!(f, "{s}"),
        }
    }
}

impl Render for ColumnRef {
    fn render(&self, _ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(table) = &self.table {
            let table = Ident(table.as_str());
            write!(f, "{table}.")?;
        }
        let column = Ident(self.column.as_str());
        write!(f, "{column}")
    }
}

impl Render for QualifiedTable {
    fn render(&self, _ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            let schema = Ident(schema.as_str());
            write!(f, "{schema}.")?;
        }
        let table = Ident(self.table.as_str());
        write!(f, "{table}")
    }
}

impl Render for SelectColumn {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectColumn::Star => write!(f, "*"),
            SelectColumn::Expr { expr, alias } => {
                let expr = Fmt(ctx, expr);
                write!(f, "{expr}")?;
                if let Some(alias) = alias {
                    let alias = Ident(alias.as_str());
                    write!(f, " AS {alias}")?;
                }
                Ok(())
            }
        }
    }
}

impl Render for OrderBy {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expr = Fmt(ctx, &self.expr);
        let dir = if self.desc { "DESC" } else { "ASC" };
        write!(f, "{expr} {dir}")?;
        match self.nulls {
            Some(NullsOrder::First) => write!(f, " NULLS FIRST"),
            Some(NullsOrder::Last) => write!(f, " NULLS LAST"),
            None => Ok(()),
        }
    }
}

fn render_where(
    ctx: &RenderContext,
    f: &mut fmt::Formatter<'_>,
    where_: &Option<Expr>,
) -> fmt::Result {
    if let Some(where_) = where_ {
        let sep = ctx.sep();
        let where_ = Fmt(ctx, where_);
        write!(f, "{sep}WHERE {where_}")?;
    }
    Ok(())
}

fn render_returning(
    ctx: &RenderContext,
    f: &mut fmt::Formatter<'_>,
    returning: &[SelectColumn],
) -> fmt::Result {
    if !returning.is_empty() {
        write!(f, "{}RETURNING ", ctx.sep())?;
        comma_list(ctx, f, returning)?;
    }
    Ok(())
}

impl Render for SelectStmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = ctx.sep();
        write!(f, "SELECT ")?;

        // Columns
        if self.columns.is_empty() {
            write!(f, "*")?;
        } else {
            comma_list(ctx, f, &self.columns)?;
        }

        // FROM
        if let Some(from) = &self.from {
            let table = Fmt(ctx, &from.table);
            write!(f, "{sep}FROM {table}")?;
            if let Some(alias) = &from.alias {
                let alias = Ident(alias.as_str());
                write!(f, " {alias}")?;
            }
        }

        render_where(ctx, f, &self.where_)?;

        // ORDER BY
        if !self.order_by.is_empty() {
            write!(f, "{sep}ORDER BY ")?;
            comma_list(ctx, f, &self.order_by)?;
        }

        if let Some(limit) = self.limit {
            write!(f, "{sep}LIMIT {limit}")?;
        }

        if let Some(offset) = self.offset {
            write!(f, "{sep}OFFSET {offset}")?;
        }

        Ok(())
    }
}

impl Render for InsertStmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = ctx.sep();
        let table = Fmt(ctx, &self.table);
        write!(f, "INSERT INTO {table} (")?;

        // Columns
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let col = Ident(col.as_str());
            write!(f, "{col}")?;
        }
        write!(f, ")")?;

        // VALUES
        write!(f, "{sep}VALUES ")?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "(")?;
            comma_list(ctx, f, row)?;
            write!(f, ")")?;
        }

        // ON CONFLICT
        if let Some(conflict) = &self.on_conflict {
            write!(f, "{sep}ON CONFLICT (")?;
            for (i, col) in conflict.columns.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                let col = Ident(col.as_str());
                write!(f, "{col}")?;
            }
            write!(f, ")")?;

            match &conflict.action {
                ConflictAction::DoNothing => {
                    write!(f, " DO NOTHING")?;
                }
                ConflictAction::DoUpdate(assignments) => {
                    write!(f, " DO UPDATE SET ")?;
                    render_assignments(ctx, f, assignments)?;
                }
            }
        }

        render_returning(ctx, f, &self.returning)
    }
}

fn render_assignments(
    ctx: &RenderContext,
    f: &mut fmt::Formatter<'_>,
    assignments: &[UpdateAssignment],
) -> fmt::Result {
    for (i, assign) in assignments.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        let col = Ident(assign.column.as_str());
        let val = Fmt(ctx, &assign.value);
        write!(f, "{col} = {val}")?;
    }
    Ok(())
}

impl Render for UpdateStmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = ctx.sep();
        let table = Fmt(ctx, &self.table);
        write!(f, "UPDATE {table}")?;

        // SET
        write!(f, "{sep}SET ")?;
        render_assignments(ctx, f, &self.assignments)?;

        render_where(ctx, f, &self.where_)?;
        render_returning(ctx, f, &self.returning)
    }
}

impl Render for DeleteStmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = Fmt(ctx, &self.table);
        write!(f, "DELETE FROM {table}")?;

        render_where(ctx, f, &self.where_)?;
        render_returning(ctx, f, &self.returning)
    }
}

impl Render for TruncateStmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = Fmt(ctx, &self.table);
        write!(f, "TRUNCATE {table}")?;
        if self.restart_identity {
            write!(f, " RESTART IDENTITY")?;
        }
        if self.cascade {
            write!(f, " CASCADE")?;
        }
        Ok(())
    }
}

impl Render for Stmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Select(s) => s.render(ctx, f),
            Stmt::Insert(s) => s.render(ctx, f),
            Stmt::Update(s) => s.render(ctx, f),
            Stmt::Delete(s) => s.render(ctx, f),
            Stmt::Truncate(s) => s.render(ctx, f),
        }
    }
}

// ============================================================================
// Convenience methods
// ============================================================================

/// Render a statement to SQL, one clause per line.
pub fn render(stmt: &impl Render) -> String {
    render_with(stmt, Layout::Pretty)
}

/// Render a statement to SQL on a single line.
pub fn render_compact(stmt: &impl Render) -> String {
    render_with(stmt, Layout::Compact)
}

pub fn render_with(stmt: &impl Render, layout: Layout) -> String {
    let ctx = RenderContext::new(layout);
    format!("{}", Fmt(&ctx, stmt))
}

#[cfg(test)]
mod tests;
