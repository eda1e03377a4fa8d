//! Filters and values to SQL expressions.

use pgscribe_schema::{Filter, FilterOp, FilterTarget, Value};
use pgscribe_sql::{BinOp, Expr, IsTest};

use crate::StatementError;

/// Turn a value into a literal expression.
pub(crate) fn value_expr(value: &Value) -> Expr {
    match value {
        Value::Null => Expr::Null,
        Value::Bool(b) => Expr::Bool(*b),
        Value::Int(n) => Expr::Int(*n),
        Value::Float(n) => Expr::Float(*n),
        Value::Text(s) => Expr::String(s.clone()),
        Value::Json(doc) => Expr::String(doc.clone()).cast("jsonb"),
        Value::Array(items) => Expr::Array {
            items: items.iter().map(value_expr).collect(),
            element_type: None,
        },
        Value::Default => Expr::Default,
    }
}

fn invalid(filter: &Filter, reason: impl Into<String>) -> StatementError {
    StatementError::InvalidFilter {
        target: filter.target.to_string(),
        reason: reason.into(),
    }
}

fn comparison(op: FilterOp) -> Option<BinOp> {
    let op = match op {
        FilterOp::Eq => BinOp::Eq,
        FilterOp::Neq => BinOp::Ne,
        FilterOp::Gt => BinOp::Gt,
        FilterOp::Gte => BinOp::Ge,
        FilterOp::Lt => BinOp::Lt,
        FilterOp::Lte => BinOp::Le,
        FilterOp::Like => BinOp::Like,
        FilterOp::ILike => BinOp::ILike,
        FilterOp::Contains => BinOp::Contains,
        FilterOp::ContainedBy => BinOp::ContainedBy,
        FilterOp::RangeLt => BinOp::StrictlyLeft,
        FilterOp::RangeGt => BinOp::StrictlyRight,
        FilterOp::RangeLte => BinOp::NotExtendRight,
        FilterOp::RangeGte => BinOp::NotExtendLeft,
        FilterOp::RangeAdjacent => BinOp::Adjacent,
        FilterOp::Overlaps => BinOp::Overlaps,
        FilterOp::Is | FilterOp::In => return None,
    };
    Some(op)
}

/// Translate one filter into a WHERE condition.
pub(crate) fn filter_expr(filter: &Filter) -> Result<Expr, StatementError> {
    if matches!(filter.value, Value::Default) {
        return Err(invalid(filter, "DEFAULT is not a comparable value"));
    }

    match &filter.target {
        FilterTarget::Column(column) => column_filter(filter, Expr::column(column.as_str().into())),
        FilterTarget::Tuple(columns) => tuple_filter(filter, columns),
    }
}

fn column_filter(filter: &Filter, lhs: Expr) -> Result<Expr, StatementError> {
    match filter.op {
        FilterOp::Is => Ok(lhs.is(is_test(filter)?)),
        FilterOp::In => {
            let items = list_items(filter)?;
            Ok(lhs.in_list(items))
        }
        FilterOp::Like | FilterOp::ILike if filter.value.as_text().is_none() => {
            Err(invalid(filter, "pattern must be text"))
        }
        op => {
            // Every other operator is in the comparison table.
            let bin = comparison(op).ok_or_else(|| invalid(filter, "unsupported operator"))?;
            Ok(lhs.binop(bin, value_expr(&filter.value)))
        }
    }
}

fn is_test(filter: &Filter) -> Result<IsTest, StatementError> {
    match &filter.value {
        Value::Null => Ok(IsTest::Null),
        Value::Bool(true) => Ok(IsTest::True),
        Value::Bool(false) => Ok(IsTest::False),
        Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "null" => Ok(IsTest::Null),
            "not null" => Ok(IsTest::NotNull),
            "true" => Ok(IsTest::True),
            "false" => Ok(IsTest::False),
            _ => Err(invalid(filter, "`is` expects null, not null, true or false")),
        },
        _ => Err(invalid(filter, "`is` expects null, not null, true or false")),
    }
}

/// Items of an `in` list: an array value, or a comma-separated string.
fn list_items(filter: &Filter) -> Result<Vec<Expr>, StatementError> {
    let items: Vec<Expr> = match &filter.value {
        Value::Array(items) => items.iter().map(value_expr).collect(),
        Value::Text(s) => split_list(s).map(Expr::string).collect(),
        other => vec![value_expr(other)],
    };
    if items.is_empty() {
        return Err(invalid(filter, "`in` needs at least one value"));
    }
    Ok(items)
}

fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn tuple_filter(filter: &Filter, columns: &[String]) -> Result<Expr, StatementError> {
    if columns.is_empty() {
        return Err(invalid(filter, "no columns"));
    }
    if !filter.op.supports_tuples() {
        return Err(invalid(
            filter,
            format!("`{}` cannot compare row values", filter.op),
        ));
    }

    let lhs = Expr::Row(
        columns
            .iter()
            .map(|c| Expr::column(c.as_str().into()))
            .collect(),
    );

    if filter.op == FilterOp::In {
        let Value::Array(rows) = &filter.value else {
            return Err(invalid(filter, "`in` on a row value expects a list of rows"));
        };
        if rows.is_empty() {
            return Err(invalid(filter, "`in` needs at least one value"));
        }
        let rows = rows
            .iter()
            .map(|row| tuple_row(filter, columns.len(), row))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(lhs.in_list(rows));
    }

    let bin = comparison(filter.op).ok_or_else(|| invalid(filter, "unsupported operator"))?;
    let rhs = tuple_row(filter, columns.len(), &filter.value)?;
    Ok(lhs.binop(bin, rhs))
}

/// One row value, from an array or a comma-separated string.
fn tuple_row(filter: &Filter, arity: usize, value: &Value) -> Result<Expr, StatementError> {
    let items: Vec<Expr> = match value {
        Value::Array(items) => items.iter().map(value_expr).collect(),
        Value::Text(s) => split_list(s).map(Expr::string).collect(),
        _ => return Err(invalid(filter, "row value expects a list")),
    };
    if items.len() != arity {
        return Err(invalid(
            filter,
            format!(
                "row value has {} values but {} columns",
                items.len(),
                arity
            ),
        ));
    }
    Ok(Expr::Row(items))
}
