//! SQL statements.

use crate::expr::Expr;
use crate::{ColumnName, SchemaName, TableName};

/// A SQL statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    Select(SelectStmt),
    Insert(InsertStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
    Truncate(TruncateStmt),
}

/// A table name, optionally qualified with its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedTable {
    pub schema: Option<SchemaName>,
    pub table: TableName,
}

impl QualifiedTable {
    pub fn new(table: TableName) -> Self {
        Self {
            schema: None,
            table,
        }
    }

    pub fn qualified(schema: SchemaName, table: TableName) -> Self {
        Self {
            schema: Some(schema),
            table,
        }
    }
}

/// A SELECT statement.
#[derive(Debug, Clone, Default)]
pub struct SelectStmt {
    pub columns: Vec<SelectColumn>,
    pub from: Option<FromClause>,
    pub where_: Option<Expr>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// A column in a SELECT or RETURNING clause.
#[derive(Debug, Clone)]
pub enum SelectColumn {
    /// `*`
    Star,

    /// An expression with an optional alias
    Expr {
        expr: Expr,
        alias: Option<ColumnName>,
    },
}

impl SelectColumn {
    pub fn expr(expr: Expr) -> Self {
        SelectColumn::Expr { expr, alias: None }
    }

    pub fn aliased(expr: Expr, alias: ColumnName) -> Self {
        SelectColumn::Expr {
            expr,
            alias: Some(alias),
        }
    }
}

/// A FROM clause.
#[derive(Debug, Clone)]
pub struct FromClause {
    pub table: QualifiedTable,
    pub alias: Option<TableName>,
}

impl FromClause {
    pub fn table(table: QualifiedTable) -> Self {
        Self { table, alias: None }
    }

    pub fn aliased(table: QualifiedTable, alias: TableName) -> Self {
        Self {
            table,
            alias: Some(alias),
        }
    }
}

/// ORDER BY clause.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub expr: Expr,
    pub desc: bool,
    pub nulls: Option<NullsOrder>,
}

impl OrderBy {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            desc: false,
            nulls: None,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            desc: true,
            nulls: None,
        }
    }

    pub fn nulls(mut self, nulls: NullsOrder) -> Self {
        self.nulls = Some(nulls);
        self
    }
}

/// NULLS FIRST / NULLS LAST
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

impl SelectStmt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, cols: impl IntoIterator<Item = SelectColumn>) -> Self {
        self.columns.extend(cols);
        self
    }

    pub fn column(mut self, col: SelectColumn) -> Self {
        self.columns.push(col);
        self
    }

    pub fn from(mut self, from: FromClause) -> Self {
        self.from = Some(from);
        self
    }

    pub fn where_(mut self, expr: Expr) -> Self {
        self.where_ = Some(expr);
        self
    }

    pub fn and_where(mut self, expr: Expr) -> Self {
        self.where_ = Some(match self.where_ {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
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
}

/// An INSERT statement, with one or more rows of values.
#[derive(Debug, Clone)]
pub struct InsertStmt {
    pub table: QualifiedTable,
    pub columns: Vec<ColumnName>,
    pub rows: Vec<Vec<Expr>>,
    pub on_conflict: Option<OnConflict>,
    pub returning: Vec<SelectColumn>,
}

/// ON CONFLICT clause for upserts.
#[derive(Debug, Clone)]
pub struct OnConflict {
    pub columns: Vec<ColumnName>,
    pub action: ConflictAction,
}

/// What to do on conflict.
#[derive(Debug, Clone)]
pub enum ConflictAction {
    DoNothing,
    DoUpdate(Vec<UpdateAssignment>),
}

/// A column assignment in UPDATE SET or ON CONFLICT DO UPDATE SET.
#[derive(Debug, Clone)]
pub struct UpdateAssignment {
    pub column: ColumnName,
    pub value: Expr,
}

impl UpdateAssignment {
    pub fn new(column: ColumnName, value: Expr) -> Self {
        Self { column, value }
    }
}

impl InsertStmt {
    pub fn new(table: QualifiedTable) -> Self {
        Self {
            table,
            columns: Vec::new(),
            rows: Vec::new(),
            on_conflict: None,
            returning: Vec::new(),
        }
    }

    pub fn columns(mut self, columns: impl IntoIterator<Item = ColumnName>) -> Self {
        self.columns.extend(columns);
        self
    }

    pub fn row(mut self, values: Vec<Expr>) -> Self {
        self.rows.push(values);
        self
    }

    pub fn on_conflict(mut self, on_conflict: OnConflict) -> Self {
        self.on_conflict = Some(on_conflict);
        self
    }

    pub fn returning(mut self, cols: impl IntoIterator<Item = SelectColumn>) -> Self {
        self.returning.extend(cols);
        self
    }
}

/// An UPDATE statement.
#[derive(Debug, Clone)]
pub struct UpdateStmt {
    pub table: QualifiedTable,
    pub assignments: Vec<UpdateAssignment>,
    pub where_: Option<Expr>,
    pub returning: Vec<SelectColumn>,
}

impl UpdateStmt {
    pub fn new(table: QualifiedTable) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            where_: None,
            returning: Vec::new(),
        }
    }

    pub fn set(mut self, column: ColumnName, value: Expr) -> Self {
        self.assignments.push(UpdateAssignment::new(column, value));
        self
    }

    pub fn where_(mut self, expr: Expr) -> Self {
        self.where_ = Some(expr);
        self
    }

    pub fn returning(mut self, cols: impl IntoIterator<Item = SelectColumn>) -> Self {
        self.returning.extend(cols);
        self
    }
}

/// A DELETE statement.
#[derive(Debug, Clone)]
pub struct DeleteStmt {
    pub table: QualifiedTable,
    pub where_: Option<Expr>,
    pub returning: Vec<SelectColumn>,
}

impl DeleteStmt {
    pub fn new(table: QualifiedTable) -> Self {
        Self {
            table,
            where_: None,
            returning: Vec::new(),
        }
    }

    pub fn where_(mut self, expr: Expr) -> Self {
        self.where_ = Some(expr);
        self
    }

    pub fn returning(mut self, cols: impl IntoIterator<Item = SelectColumn>) -> Self {
        self.returning.extend(cols);
        self
    }
}

/// A TRUNCATE statement.
#[derive(Debug, Clone)]
pub struct TruncateStmt {
    pub table: QualifiedTable,
    pub restart_identity: bool,
    pub cascade: bool,
}

impl TruncateStmt {
    pub fn new(table: QualifiedTable) -> Self {
        Self {
            table,
            restart_identity: false,
            cascade: false,
        }
    }

    pub fn restart_identity(mut self, yes: bool) -> Self {
        self.restart_identity = yes;
        self
    }

    pub fn cascade(mut self, yes: bool) -> Self {
        self.cascade = yes;
        self
    }
}
