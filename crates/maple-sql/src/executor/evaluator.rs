//! Expression evaluation.
//!
//! Expressions evaluate in the context of a row and its schema. A
//! column reference that names no schema column evaluates as NULL, and
//! `=` yields false whenever either side is NULL, so a WHERE clause
//! over an unknown column simply matches nothing.

use std::sync::Arc;

use maple_common::error::MapleResult;

use crate::parser::{BinaryOperator, Expr};
use crate::storage::TableSchema;

use super::{Row, Value};

/// A synthesized WHERE predicate: row in, match decision out.
pub type RowPredicate = Box<dyn Fn(&Row) -> MapleResult<bool>>;

/// Evaluates an expression in an optional row context.
///
/// Without a row (UPDATE SET right-hand sides), column references
/// evaluate as NULL.
pub fn eval_expr(expr: &Expr, row: Option<&Row>, schema: &TableSchema) -> MapleResult<Value> {
    match expr {
        Expr::Literal(lit) => Ok(Value::from_literal(lit)),
        Expr::Column(name) => Ok(lookup_column(name, row, schema)),
        Expr::BinaryOp { left, op, right } => {
            let left = eval_expr(left, row, schema)?;
            let right = eval_expr(right, row, schema)?;
            match op {
                BinaryOperator::Eq => Ok(Value::Boolean(left.sql_eq(&right))),
                BinaryOperator::And => Ok(Value::Boolean(left.as_bool()? && right.as_bool()?)),
                BinaryOperator::Or => Ok(Value::Boolean(left.as_bool()? || right.as_bool()?)),
            }
        }
    }
}

/// Builds a row predicate from an optional WHERE expression.
///
/// A missing WHERE is "always true". The result of the expression is
/// coerced to a boolean.
pub fn build_predicate(expr: Option<Expr>, schema: Arc<TableSchema>) -> RowPredicate {
    match expr {
        None => Box::new(|_| Ok(true)),
        Some(expr) => Box::new(move |row| eval_expr(&expr, Some(row), &schema)?.as_bool()),
    }
}

fn lookup_column(name: &str, row: Option<&Row>, schema: &TableSchema) -> Value {
    let row = match row {
        Some(row) => row,
        None => return Value::Null,
    };
    match schema.index_of(name) {
        Some(idx) => row.get(idx).cloned().unwrap_or(Value::Null),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Constraint, DataType, Literal};
    use crate::storage::ColumnDefinition;

    fn schema() -> Arc<TableSchema> {
        Arc::new(
            TableSchema::new(
                "t",
                vec![
                    ColumnDefinition::new("id", DataType::Int, vec![Constraint::PrimaryKey]),
                    ColumnDefinition::new("name", DataType::Text, vec![]),
                ],
            )
            .unwrap(),
        )
    }

    fn row() -> Row {
        Row::new(vec![Value::Int(1), Value::string("ada")])
    }

    #[test]
    fn test_eval_literal() {
        let value = eval_expr(
            &Expr::literal(Literal::Integer(7)),
            Some(&row()),
            &schema(),
        )
        .unwrap();
        assert_eq!(value, Value::Int(7));
    }

    #[test]
    fn test_eval_column() {
        let value = eval_expr(&Expr::column("name"), Some(&row()), &schema()).unwrap();
        assert_eq!(value, Value::string("ada"));
    }

    #[test]
    fn test_unknown_column_is_null() {
        let value = eval_expr(&Expr::column("ghost"), Some(&row()), &schema()).unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_equality_on_unknown_column_is_false() {
        let expr = Expr::column("ghost").eq(Expr::literal(Literal::Integer(1)));
        let value = eval_expr(&expr, Some(&row()), &schema()).unwrap();
        assert_eq!(value, Value::Boolean(false));
    }

    #[test]
    fn test_predicate_missing_where_matches_all() {
        let pred = build_predicate(None, schema());
        assert!(pred(&row()).unwrap());
    }

    #[test]
    fn test_predicate_equality() {
        let expr = Expr::column("id").eq(Expr::literal(Literal::Integer(1)));
        let pred = build_predicate(Some(expr), schema());
        assert!(pred(&row()).unwrap());

        let expr = Expr::column("id").eq(Expr::literal(Literal::Integer(2)));
        let pred = build_predicate(Some(expr), schema());
        assert!(!pred(&row()).unwrap());
    }

    #[test]
    fn test_predicate_conjunction() {
        let expr = Expr::column("id")
            .eq(Expr::literal(Literal::Integer(1)))
            .and(Expr::column("name").eq(Expr::literal(Literal::String("ada".into()))));
        let pred = build_predicate(Some(expr), schema());
        assert!(pred(&row()).unwrap());
    }

    #[test]
    fn test_column_without_row_context_is_null() {
        let value = eval_expr(&Expr::column("id"), None, &schema()).unwrap();
        assert_eq!(value, Value::Null);
    }
}
