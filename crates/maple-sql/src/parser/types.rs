//! SQL data types, literals, and column constraints.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlparser::ast as sql_ast;

use super::{ParseError, ParseResult};

/// SQL data types supported by MapleDB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit signed integer (INT, INTEGER).
    Int,
    /// 64-bit floating point (FLOAT, REAL, DOUBLE).
    Float,
    /// UTF-8 string (TEXT, VARCHAR, CHAR, STRING).
    Text,
    /// Boolean (BOOL, BOOLEAN).
    Boolean,
}

impl DataType {
    /// Converts from sqlparser's DataType.
    pub fn from_sql_ast(dt: &sql_ast::DataType) -> ParseResult<Self> {
        match dt {
            sql_ast::DataType::Int(_) | sql_ast::DataType::Integer(_) => Ok(DataType::Int),
            sql_ast::DataType::Float(_)
            | sql_ast::DataType::Real
            | sql_ast::DataType::Double
            | sql_ast::DataType::DoublePrecision => Ok(DataType::Float),
            sql_ast::DataType::Text
            | sql_ast::DataType::Varchar(_)
            | sql_ast::DataType::Char(_)
            | sql_ast::DataType::CharacterVarying(_) => Ok(DataType::Text),
            sql_ast::DataType::Boolean | sql_ast::DataType::Bool => Ok(DataType::Boolean),
            // `STRING` is not a PostgreSQL type name; it reaches us as a
            // custom type.
            sql_ast::DataType::Custom(name, _)
                if name.to_string().eq_ignore_ascii_case("string") =>
            {
                Ok(DataType::Text)
            }
            _ => Err(ParseError::Unsupported(format!("data type {dt}"))),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "INT"),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Text => write!(f, "TEXT"),
            DataType::Boolean => write!(f, "BOOL"),
        }
    }
}

/// Column constraints.
///
/// Multiple PRIMARY KEY columns form a composite key whose order follows
/// column-definition order. UNIQUE is recognized but not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constraint {
    /// Part of the (possibly composite) primary key.
    PrimaryKey,
    /// The column must be present and non-Null.
    NotNull,
    /// Recognized, unenforced.
    Unique,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::PrimaryKey => write!(f, "PRIMARY KEY"),
            Constraint::NotNull => write!(f, "NOT NULL"),
            Constraint::Unique => write!(f, "UNIQUE"),
        }
    }
}

/// A literal value in SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// NULL.
    Null,
    /// TRUE or FALSE.
    Boolean(bool),
    /// Integer literal.
    Integer(i64),
    /// Floating-point literal.
    Float(f64),
    /// Quoted string literal.
    String(String),
}

impl Literal {
    /// Returns true if this is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// Converts from sqlparser's Value.
    pub fn from_sql_ast(value: &sql_ast::Value) -> ParseResult<Self> {
        match value {
            sql_ast::Value::Null => Ok(Literal::Null),
            sql_ast::Value::Boolean(b) => Ok(Literal::Boolean(*b)),
            sql_ast::Value::Number(n, _) => {
                if let Ok(i) = n.parse::<i64>() {
                    Ok(Literal::Integer(i))
                } else if let Ok(f) = n.parse::<f64>() {
                    Ok(Literal::Float(f))
                } else {
                    Err(ParseError::InvalidLiteral(format!("invalid number: {n}")))
                }
            }
            sql_ast::Value::SingleQuotedString(s) | sql_ast::Value::DoubleQuotedString(s) => {
                Ok(Literal::String(s.clone()))
            }
            _ => Err(ParseError::Unsupported(format!("literal {value:?}"))),
        }
    }

    /// Negates a numeric literal (folds unary minus).
    pub fn negated(self) -> ParseResult<Self> {
        match self {
            Literal::Integer(i) => Ok(Literal::Integer(-i)),
            Literal::Float(f) => Ok(Literal::Float(-f)),
            other => Err(ParseError::InvalidLiteral(format!(
                "cannot negate {other:?}"
            ))),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "NULL"),
            Literal::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Literal::Integer(i) => write!(f, "{i}"),
            Literal::Float(v) => write!(f, "{v}"),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_display() {
        assert_eq!(DataType::Int.to_string(), "INT");
        assert_eq!(DataType::Text.to_string(), "TEXT");
    }

    #[test]
    fn test_literal_display() {
        assert_eq!(Literal::Null.to_string(), "NULL");
        assert_eq!(Literal::Integer(42).to_string(), "42");
        assert_eq!(Literal::String("it's".into()).to_string(), "'it''s'");
        assert_eq!(Literal::Boolean(true).to_string(), "TRUE");
    }

    #[test]
    fn test_literal_negation() {
        assert_eq!(
            Literal::Integer(5).negated().unwrap(),
            Literal::Integer(-5)
        );
        assert_eq!(
            Literal::Float(1.5).negated().unwrap(),
            Literal::Float(-1.5)
        );
        assert!(Literal::String("x".into()).negated().is_err());
    }
}
