//! Statement text from structured specs.
//!
//! A [`StatementSpec`] is an immutable description of one statement: the
//! table, what to do, and the filters, sorts and payload that go with it.
//! [`StatementBuilder::build`] turns it into a single `;`-terminated
//! statement. Nothing is executed.
//!
//! ```
//! use pgscribe::statement::{StatementBuilder, StatementSpec};
//! use pgscribe::schema::{Column, DataType, Filter, FilterOp, TableDescriptor};
//!
//! let users = TableDescriptor::new("public", "users")
//!     .column(Column::new("id", DataType::BigInt).primary_key())
//!     .column(Column::new("name", DataType::Text));
//!
//! let spec = StatementSpec::delete(&users).filter(Filter::new("id", FilterOp::Eq, 1));
//! let sql = StatementBuilder::default().build(&spec).unwrap();
//! assert_eq!(sql, r#"DELETE FROM "public"."users" WHERE "id" = 1;"#);
//! ```

use pgscribe_config::StatementsConfig;
use pgscribe_schema::{Filter, NullsOrder, RowPayload, Sort, SortOrder, TableDescriptor, Value};
use pgscribe_sql::{
    ColumnName, ConflictAction, DeleteStmt, Expr, FromClause, InsertStmt, OnConflict, OrderBy,
    QualifiedTable, SelectColumn, SelectStmt, Stmt, TruncateStmt, UpdateAssignment, UpdateStmt,
    render_compact,
};

use crate::StatementError;

mod filter;
use filter::{filter_expr, value_expr};

/// What the statement does.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// SELECT; an empty column list selects `*`
    Select { columns: Vec<String> },
    /// SELECT COUNT(*)
    Count,
    Insert { rows: Vec<RowPayload> },
    Update { row: RowPayload },
    /// INSERT ... ON CONFLICT (key) DO UPDATE
    Upsert { rows: Vec<RowPayload> },
    Delete,
    Truncate { restart_identity: bool, cascade: bool },
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Select { .. } => "select",
            Action::Count => "count",
            Action::Insert { .. } => "insert",
            Action::Update { .. } => "update",
            Action::Upsert { .. } => "upsert",
            Action::Delete => "delete",
            Action::Truncate { .. } => "truncate",
        }
    }
}

/// One statement against one table.
///
/// Filters apply to select, count, update and delete. Sorts, limit and
/// offset apply to select. `returning` applies to insert, update, upsert and
/// delete.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementSpec<'t> {
    pub table: &'t TableDescriptor,
    pub action: Action,
    pub filters: Vec<Filter>,
    pub sorts: Vec<Sort>,
    pub returning: bool,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl<'t> StatementSpec<'t> {
    pub fn new(table: &'t TableDescriptor, action: Action) -> Self {
        Self {
            table,
            action,
            filters: Vec::new(),
            sorts: Vec::new(),
            returning: false,
            limit: None,
            offset: None,
        }
    }

    pub fn select(table: &'t TableDescriptor) -> Self {
        Self::new(table, Action::Select { columns: Vec::new() })
    }

    pub fn select_columns(
        table: &'t TableDescriptor,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let columns = columns.into_iter().map(Into::into).collect();
        Self::new(table, Action::Select { columns })
    }

    pub fn count(table: &'t TableDescriptor) -> Self {
        Self::new(table, Action::Count)
    }

    pub fn insert(table: &'t TableDescriptor, rows: impl IntoIterator<Item = RowPayload>) -> Self {
        let rows = rows.into_iter().collect();
        Self::new(table, Action::Insert { rows })
    }

    pub fn update(table: &'t TableDescriptor, row: RowPayload) -> Self {
        Self::new(table, Action::Update { row })
    }

    pub fn upsert(table: &'t TableDescriptor, rows: impl IntoIterator<Item = RowPayload>) -> Self {
        let rows = rows.into_iter().collect();
        Self::new(table, Action::Upsert { rows })
    }

    pub fn delete(table: &'t TableDescriptor) -> Self {
        Self::new(table, Action::Delete)
    }

    pub fn truncate(table: &'t TableDescriptor) -> Self {
        Self::new(
            table,
            Action::Truncate {
                restart_identity: false,
                cascade: false,
            },
        )
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn returning(mut self) -> Self {
        self.returning = true;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Rows `from..=to`, zero-based.
    pub fn range(self, from: u64, to: u64) -> Self {
        let count = to.saturating_sub(from).saturating_add(1);
        self.limit(if to < from { 0 } else { count }).offset(from)
    }

    /// Set TRUNCATE options. No effect on other actions.
    pub fn truncate_options(mut self, restart_identity: bool, cascade: bool) -> Self {
        if let Action::Truncate { .. } = self.action {
            self.action = Action::Truncate {
                restart_identity,
                cascade,
            };
        }
        self
    }
}

/// Turns [`StatementSpec`]s into SQL text.
#[derive(Debug, Clone, Default)]
pub struct StatementBuilder {
    require_filter_for_mutations: bool,
}

impl StatementBuilder {
    pub fn new(config: &StatementsConfig) -> Self {
        Self {
            require_filter_for_mutations: config.require_filter_for_mutations(),
        }
    }

    /// Build one `;`-terminated statement.
    pub fn build(&self, spec: &StatementSpec<'_>) -> Result<String, StatementError> {
        let stmt = self.build_stmt(spec)?;
        Ok(format!("{};", render_compact(&stmt)))
    }

    /// Build the statement AST without rendering it.
    pub fn build_stmt(&self, spec: &StatementSpec<'_>) -> Result<Stmt, StatementError> {
        let table = spec.table;
        if table.columns.is_empty() {
            return Err(StatementError::InvalidTable {
                table: table.qualified_name(),
            });
        }

        let stmt = match &spec.action {
            Action::Select { columns } => Stmt::Select(select(spec, columns)?),
            Action::Count => {
                let mut stmt = SelectStmt::new()
                    .column(SelectColumn::expr(Expr::CountStar))
                    .from(FromClause::table(target(table)));
                stmt.where_ = where_clause(&spec.filters)?;
                Stmt::Select(stmt)
            }
            Action::Insert { rows } => Stmt::Insert(insert(spec, rows, "insert")?),
            Action::Upsert { rows } => {
                let mut stmt = insert(spec, rows, "upsert")?;
                stmt.on_conflict = Some(on_conflict(table, &stmt.columns)?);
                Stmt::Insert(stmt)
            }
            Action::Update { row } => {
                self.check_filtered(spec)?;
                Stmt::Update(update(spec, row)?)
            }
            Action::Delete => {
                self.check_filtered(spec)?;
                let mut stmt = DeleteStmt::new(target(table)).returning(returning(spec));
                stmt.where_ = where_clause(&spec.filters)?;
                Stmt::Delete(stmt)
            }
            Action::Truncate {
                restart_identity,
                cascade,
            } => Stmt::Truncate(
                TruncateStmt::new(target(table))
                    .restart_identity(*restart_identity)
                    .cascade(*cascade),
            ),
        };

        tracing::trace!(table = %table.qualified_name(), action = spec.action.name(), "built statement");
        Ok(stmt)
    }

    fn check_filtered(&self, spec: &StatementSpec<'_>) -> Result<(), StatementError> {
        if self.require_filter_for_mutations && spec.filters.is_empty() {
            return Err(StatementError::MutationWithoutFilter {
                action: spec.action.name(),
                table: spec.table.qualified_name(),
            });
        }
        Ok(())
    }
}

/// Build with the default configuration.
pub fn build(spec: &StatementSpec<'_>) -> Result<String, StatementError> {
    StatementBuilder::default().build(spec)
}

fn target(table: &TableDescriptor) -> QualifiedTable {
    if table.schema.is_empty() {
        QualifiedTable::new(table.name.as_str().into())
    } else {
        QualifiedTable::qualified(table.schema.as_str().into(), table.name.as_str().into())
    }
}

fn where_clause(filters: &[Filter]) -> Result<Option<Expr>, StatementError> {
    let conditions = filters
        .iter()
        .map(filter_expr)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Expr::all(conditions))
}

fn order_by(sort: &Sort) -> OrderBy {
    let expr = Expr::column(sort.column.as_str().into());
    let order = match sort.order {
        SortOrder::Asc => OrderBy::asc(expr),
        SortOrder::Desc => OrderBy::desc(expr),
    };
    match sort.nulls {
        NullsOrder::Default => order,
        NullsOrder::First => order.nulls(pgscribe_sql::NullsOrder::First),
        NullsOrder::Last => order.nulls(pgscribe_sql::NullsOrder::Last),
    }
}

fn select(spec: &StatementSpec<'_>, columns: &[String]) -> Result<SelectStmt, StatementError> {
    let mut stmt = SelectStmt::new()
        .columns(
            columns
                .iter()
                .map(|c| SelectColumn::expr(Expr::column(c.as_str().into()))),
        )
        .from(FromClause::table(target(spec.table)));
    stmt.where_ = where_clause(&spec.filters)?;
    for sort in &spec.sorts {
        stmt = stmt.order_by(order_by(sort));
    }
    stmt.limit = spec.limit;
    stmt.offset = spec.offset;
    Ok(stmt)
}

/// `RETURNING *`, plus a readable `text[]` copy of every enum-array column.
fn returning(spec: &StatementSpec<'_>) -> Vec<SelectColumn> {
    if !spec.returning {
        return Vec::new();
    }
    let mut cols = vec![SelectColumn::Star];
    for column in spec.table.enum_array_columns() {
        let name: ColumnName = column.name.as_str().into();
        cols.push(SelectColumn::aliased(
            Expr::column(name.clone()).cast("text[]"),
            name,
        ));
    }
    cols
}

/// Literal for one payload value, with the enum-array cast where flagged.
fn payload_expr(
    table: &TableDescriptor,
    row: &RowPayload,
    column: &str,
    value: &Value,
) -> Result<Expr, StatementError> {
    if !row.is_enum_array(column) {
        return Ok(value_expr(value));
    }

    let invalid = |reason: &str| StatementError::InvalidPayload {
        column: column.to_string(),
        reason: reason.to_string(),
    };
    let element_type = table
        .find_column(column)
        .filter(|c| c.data_type.is_enum_array())
        .and_then(|c| c.data_type.element())
        .ok_or_else(|| invalid("flagged as an enum array but the table does not declare one"))?;

    match value {
        Value::Array(items) => Ok(Expr::Array {
            items: items.iter().map(value_expr).collect(),
            element_type: Some(element_type.sql()),
        }),
        Value::Null | Value::Default => Ok(value_expr(value)),
        _ => Err(invalid("enum array value must be a list")),
    }
}

fn insert(
    spec: &StatementSpec<'_>,
    rows: &[RowPayload],
    action: &'static str,
) -> Result<InsertStmt, StatementError> {
    if rows.is_empty() || rows.iter().all(RowPayload::is_empty) {
        return Err(StatementError::EmptyPayload { action });
    }

    // Union of all payload columns, in first-seen order.
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for column in row.columns() {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
    }

    let mut stmt = InsertStmt::new(target(spec.table))
        .columns(columns.iter().map(|c| ColumnName::from(*c)))
        .returning(returning(spec));

    for row in rows {
        let values = columns
            .iter()
            .map(|column| match row.get(column) {
                Some(value) => payload_expr(spec.table, row, column, value),
                None => Ok(Expr::Default),
            })
            .collect::<Result<Vec<_>, _>>()?;
        stmt = stmt.row(values);
    }

    Ok(stmt)
}

/// Conflict on the primary key, else on the first unique column.
fn on_conflict(
    table: &TableDescriptor,
    inserted: &[ColumnName],
) -> Result<OnConflict, StatementError> {
    let mut key: Vec<ColumnName> = table
        .primary_key_columns()
        .map(|c| c.name.as_str().into())
        .collect();
    if key.is_empty() {
        key = table
            .unique_columns()
            .take(1)
            .map(|c| c.name.as_str().into())
            .collect();
    }
    if key.is_empty() {
        return Err(StatementError::MissingConflictTarget {
            table: table.qualified_name(),
        });
    }

    let assignments: Vec<UpdateAssignment> = inserted
        .iter()
        .filter(|c| !key.contains(c))
        .map(|c| UpdateAssignment::new(c.clone(), Expr::Excluded(c.clone())))
        .collect();

    let action = if assignments.is_empty() {
        ConflictAction::DoNothing
    } else {
        ConflictAction::DoUpdate(assignments)
    };
    Ok(OnConflict {
        columns: key,
        action,
    })
}

fn update(spec: &StatementSpec<'_>, row: &RowPayload) -> Result<UpdateStmt, StatementError> {
    if row.is_empty() {
        return Err(StatementError::EmptyPayload { action: "update" });
    }

    let mut stmt = UpdateStmt::new(target(spec.table)).returning(returning(spec));
    for (column, value) in row.iter() {
        let expr = payload_expr(spec.table, row, column, value)?;
        stmt = stmt.set(column.into(), expr);
    }
    stmt.where_ = where_clause(&spec.filters)?;
    Ok(stmt)
}

#[cfg(test)]
mod tests;
