//! SQL expressions.
//!
//! The expression grammar is deliberately small: column references,
//! literals, `=` comparisons, and AND/OR conjunctions of them. Anything
//! else sqlparser accepts is rejected with [`ParseError::Unsupported`].

use std::fmt;

use sqlparser::ast as sql_ast;

use super::types::Literal;
use super::{ParseError, ParseResult};

/// A SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column reference.
    Column(String),
    /// A literal value.
    Literal(Literal),
    /// A binary operation.
    BinaryOp {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOperator,
        /// Right operand.
        right: Box<Expr>,
    },
}

/// Supported binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// Equality comparison.
    Eq,
    /// Logical conjunction.
    And,
    /// Logical disjunction.
    Or,
}

impl Expr {
    /// Creates a column expression.
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    /// Creates a literal expression.
    pub fn literal(lit: Literal) -> Self {
        Expr::Literal(lit)
    }

    /// Creates an equality expression.
    pub fn eq(self, other: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(self),
            op: BinaryOperator::Eq,
            right: Box::new(other),
        }
    }

    /// Creates an AND expression.
    pub fn and(self, other: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(self),
            op: BinaryOperator::And,
            right: Box::new(other),
        }
    }

    /// Converts from sqlparser's Expr.
    pub fn from_sql_ast(expr: sql_ast::Expr) -> ParseResult<Self> {
        match expr {
            sql_ast::Expr::Identifier(ident) => Ok(Expr::Column(ident.value)),
            sql_ast::Expr::Value(value) => Ok(Expr::Literal(Literal::from_sql_ast(&value)?)),
            sql_ast::Expr::BinaryOp { left, op, right } => {
                let op = match op {
                    sql_ast::BinaryOperator::Eq => BinaryOperator::Eq,
                    sql_ast::BinaryOperator::And => BinaryOperator::And,
                    sql_ast::BinaryOperator::Or => BinaryOperator::Or,
                    other => {
                        return Err(ParseError::Unsupported(format!("operator {other}")))
                    }
                };
                Ok(Expr::BinaryOp {
                    left: Box::new(Expr::from_sql_ast(*left)?),
                    op,
                    right: Box::new(Expr::from_sql_ast(*right)?),
                })
            }
            sql_ast::Expr::UnaryOp {
                op: sql_ast::UnaryOperator::Minus,
                expr,
            } => match Expr::from_sql_ast(*expr)? {
                Expr::Literal(lit) => Ok(Expr::Literal(lit.negated()?)),
                other => Err(ParseError::Unsupported(format!(
                    "unary minus on {other:?}"
                ))),
            },
            sql_ast::Expr::Nested(expr) => Expr::from_sql_ast(*expr),
            other => Err(ParseError::Unsupported(format!("expression {other}"))),
        }
    }

    /// Extracts the literal from a literal expression.
    ///
    /// INSERT values and UPDATE SET right-hand sides only accept
    /// literals.
    pub fn into_literal(self) -> ParseResult<Literal> {
        match self {
            Expr::Literal(lit) => Ok(lit),
            other => Err(ParseError::Unsupported(format!(
                "expected a literal, got {other}"
            ))),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "{name}"),
            Expr::Literal(lit) => write!(f, "{lit}"),
            Expr::BinaryOp { left, op, right } => {
                let op = match op {
                    BinaryOperator::Eq => "=",
                    BinaryOperator::And => "AND",
                    BinaryOperator::Or => "OR",
                };
                write!(f, "{left} {op} {right}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_display() {
        let expr = Expr::column("id").eq(Expr::literal(Literal::Integer(1)));
        assert_eq!(expr.to_string(), "id = 1");
    }

    #[test]
    fn test_into_literal() {
        assert_eq!(
            Expr::literal(Literal::Integer(7)).into_literal().unwrap(),
            Literal::Integer(7)
        );
        assert!(Expr::column("x").into_literal().is_err());
    }
}
