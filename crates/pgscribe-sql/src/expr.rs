//! SQL expressions.

use crate::{ColumnName, TableName};

/// A SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column reference
    Column(ColumnRef),
    /// A string literal
    String(String),
    /// An integer literal
    Int(i64),
    /// A floating point literal
    Float(f64),
    /// A boolean literal
    Bool(bool),
    /// NULL
    Null,
    /// DEFAULT keyword
    Default,
    /// Binary operation (e.g., a = b, a AND b, a @> b)
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// IS NULL / IS NOT NULL / IS TRUE / IS FALSE
    Is { expr: Box<Expr>, test: IsTest },
    /// expr IN (a, b, c)
    InList { expr: Box<Expr>, items: Vec<Expr> },
    /// ARRAY[a, b]::type[], or an untyped array literal
    Array {
        items: Vec<Expr>,
        element_type: Option<String>,
    },
    /// expr::type
    Cast { expr: Box<Expr>, ty: String },
    /// Row constructor: (a, b)
    Row(Vec<Expr>),
    /// EXCLUDED.column inside ON CONFLICT DO UPDATE
    Excluded(ColumnName),
    /// Function call
    FnCall { name: String, args: Vec<Expr> },
    /// COUNT(*)
    CountStar,
    /// Parenthesized expression
    Group(Box<Expr>),
    /// Raw SQL (escape hatch)
    Raw(String),
}

/// A column reference, optionally qualified with table/alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: Option<TableName>,
    pub column: ColumnName,
}

impl ColumnRef {
    pub fn new(column: ColumnName) -> Self {
        Self {
            table: None,
            column,
        }
    }

    pub fn qualified(table: TableName, column: ColumnName) -> Self {
        Self {
            table: Some(table),
            column,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    ILike,
    /// `@>`
    Contains,
    /// `<@`
    ContainedBy,
    /// `&&`
    Overlaps,
    /// `<<`
    StrictlyLeft,
    /// `>>`
    StrictlyRight,
    /// `&<`
    NotExtendRight,
    /// `&>`
    NotExtendLeft,
    /// `-|-`
    Adjacent,
    And,
    Or,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Eq => "=",
            BinOp::Ne => "<>",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Like => "LIKE",
            BinOp::ILike => "ILIKE",
            BinOp::Contains => "@>",
            BinOp::ContainedBy => "<@",
            BinOp::Overlaps => "&&",
            BinOp::StrictlyLeft => "<<",
            BinOp::StrictlyRight => ">>",
            BinOp::NotExtendRight => "&<",
            BinOp::NotExtendLeft => "&>",
            BinOp::Adjacent => "-|-",
            BinOp::And => "AND",
            BinOp::Or => "OR",
        }
    }
}

/// The right-hand side of an `IS` test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsTest {
    Null,
    NotNull,
    True,
    False,
}

impl IsTest {
    pub fn as_str(self) -> &'static str {
        match self {
            IsTest::Null => "IS NULL",
            IsTest::NotNull => "IS NOT NULL",
            IsTest::True => "IS TRUE",
            IsTest::False => "IS FALSE",
        }
    }
}

// Convenience constructors
impl Expr {
    pub fn column(name: ColumnName) -> Self {
        Expr::Column(ColumnRef::new(name))
    }

    pub fn qualified_column(table: TableName, column: ColumnName) -> Self {
        Expr::Column(ColumnRef::qualified(table, column))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::String(s.into())
    }

    pub fn int(n: i64) -> Self {
        Expr::Int(n)
    }

    pub fn bool(b: bool) -> Self {
        Expr::Bool(b)
    }

    /// Create a binary expression: self <op> other
    pub fn binop(self, op: BinOp, other: Expr) -> Self {
        Expr::BinOp {
            left: Box::new(self),
            op,
            right: Box::new(other),
        }
    }

    /// Create an equality expression: self = other
    pub fn eq(self, other: Expr) -> Self {
        self.binop(BinOp::Eq, other)
    }

    /// Create an AND expression: self AND other
    pub fn and(self, other: Expr) -> Self {
        self.binop(BinOp::And, other)
    }

    /// Create an OR expression, parenthesized so it composes under AND.
    pub fn or(self, other: Expr) -> Self {
        Expr::Group(Box::new(self.binop(BinOp::Or, other)))
    }

    /// Create IS NULL expression
    pub fn is_null(self) -> Self {
        self.is(IsTest::Null)
    }

    /// Create IS NOT NULL expression
    pub fn is_not_null(self) -> Self {
        self.is(IsTest::NotNull)
    }

    pub fn is(self, test: IsTest) -> Self {
        Expr::Is {
            expr: Box::new(self),
            test,
        }
    }

    /// Create IN (...) expression
    pub fn in_list(self, items: Vec<Expr>) -> Self {
        Expr::InList {
            expr: Box::new(self),
            items,
        }
    }

    /// Create a cast: self::ty
    pub fn cast(self, ty: impl Into<String>) -> Self {
        Expr::Cast {
            expr: Box::new(self),
            ty: ty.into(),
        }
    }

    /// AND together a list of conditions. Returns `None` for an empty list.
    pub fn all(conditions: impl IntoIterator<Item = Expr>) -> Option<Self> {
        conditions.into_iter().reduce(Expr::and)
    }
}
