//! Filters and sorts.

use std::fmt;
use std::str::FromStr;

use crate::Value;

/// Filter operators.
///
/// Each operator has a short name (`eq`, `cs`, `sr`, ...) and parses from
/// either that name, its long alias, or its SQL symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    ILike,
    Is,
    In,
    /// Array/range containment: `@>`
    Contains,
    /// Array/range containment: `<@`
    ContainedBy,
    /// Range strictly left of: `<<`
    RangeLt,
    /// Range strictly right of: `>>`
    RangeGt,
    /// Range does not extend to the right of: `&<`
    RangeLte,
    /// Range does not extend to the left of: `&>`
    RangeGte,
    /// Range is adjacent to: `-|-`
    RangeAdjacent,
    /// Array/range overlap: `&&`
    Overlaps,
}

impl FilterOp {
    pub const ALL: [FilterOp; 18] = [
        FilterOp::Eq,
        FilterOp::Neq,
        FilterOp::Gt,
        FilterOp::Gte,
        FilterOp::Lt,
        FilterOp::Lte,
        FilterOp::Like,
        FilterOp::ILike,
        FilterOp::Is,
        FilterOp::In,
        FilterOp::Contains,
        FilterOp::ContainedBy,
        FilterOp::RangeLt,
        FilterOp::RangeGt,
        FilterOp::RangeLte,
        FilterOp::RangeGte,
        FilterOp::RangeAdjacent,
        FilterOp::Overlaps,
    ];

    /// Short name of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Like => "like",
            FilterOp::ILike => "ilike",
            FilterOp::Is => "is",
            FilterOp::In => "in",
            FilterOp::Contains => "cs",
            FilterOp::ContainedBy => "cd",
            FilterOp::RangeLt => "sl",
            FilterOp::RangeGt => "sr",
            FilterOp::RangeLte => "nxr",
            FilterOp::RangeGte => "nxl",
            FilterOp::RangeAdjacent => "adj",
            FilterOp::Overlaps => "ov",
        }
    }

    /// Whether the operator can compare a row value against a tuple.
    pub fn supports_tuples(self) -> bool {
        matches!(
            self,
            FilterOp::Eq
                | FilterOp::Neq
                | FilterOp::Gt
                | FilterOp::Gte
                | FilterOp::Lt
                | FilterOp::Lte
                | FilterOp::In
        )
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operator name that does not map to any [`FilterOp`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter operator `{0}`")]
pub struct UnknownOperator(pub String);

impl FromStr for FilterOp {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim().to_ascii_lowercase().as_str() {
            "eq" | "=" => FilterOp::Eq,
            "neq" | "<>" | "!=" => FilterOp::Neq,
            "gt" | ">" => FilterOp::Gt,
            "gte" | ">=" => FilterOp::Gte,
            "lt" | "<" => FilterOp::Lt,
            "lte" | "<=" => FilterOp::Lte,
            "like" | "~~" => FilterOp::Like,
            "ilike" | "~~*" => FilterOp::ILike,
            "is" => FilterOp::Is,
            "in" => FilterOp::In,
            "cs" | "contains" | "@>" => FilterOp::Contains,
            "cd" | "containedby" | "<@" => FilterOp::ContainedBy,
            "sl" | "range_lt" | "<<" => FilterOp::RangeLt,
            "sr" | "range_gt" | ">>" => FilterOp::RangeGt,
            "nxr" | "range_lte" | "&<" => FilterOp::RangeLte,
            "nxl" | "range_gte" | "&>" => FilterOp::RangeGte,
            "adj" | "range_adjacent" | "-|-" => FilterOp::RangeAdjacent,
            "ov" | "overlaps" | "&&" => FilterOp::Overlaps,
            _ => return Err(UnknownOperator(s.to_string())),
        };
        Ok(op)
    }
}

/// What a filter compares: one column, or a row of columns.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterTarget {
    Column(String),
    /// `("a", "b") = (1, 2)`
    Tuple(Vec<String>),
}

impl fmt::Display for FilterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterTarget::Column(c) => f.write_str(c),
            FilterTarget::Tuple(cols) => write!(f, "({})", cols.join(", ")),
        }
    }
}

/// One WHERE condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub target: FilterTarget,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            target: FilterTarget::Column(column.into()),
            op,
            value: value.into(),
        }
    }

    /// A filter over several columns at once, compared as a row value.
    pub fn tuple(
        columns: impl IntoIterator<Item = impl Into<String>>,
        op: FilterOp,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            target: FilterTarget::Tuple(columns.into_iter().map(Into::into).collect()),
            op,
            value: value.into(),
        }
    }

    /// Build a filter from an operator name, as it arrives from a caller.
    pub fn parse(
        column: impl Into<String>,
        op: &str,
        value: impl Into<Value>,
    ) -> Result<Self, UnknownOperator> {
        Ok(Self::new(column, op.parse()?, value))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending order (default)
    #[default]
    Asc,
    /// Descending order
    Desc,
}

/// Where NULLs go in a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullsOrder {
    /// Use database default (NULLS LAST for ASC, NULLS FIRST for DESC)
    #[default]
    Default,
    /// Sort nulls before non-null values
    First,
    /// Sort nulls after non-null values
    Last,
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub column: String,
    pub order: SortOrder,
    pub nulls: NullsOrder,
}

impl Sort {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Asc,
            nulls: NullsOrder::Default,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Desc,
            nulls: NullsOrder::Default,
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullsOrder::First;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = NullsOrder::Last;
        self
    }
}
