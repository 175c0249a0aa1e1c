//! Runtime values.
//!
//! [`Value`] is the tagged scalar flowing through the executor and the
//! row codec. Cross-type coercion follows SQL-ish rules: Int and Float
//! convert into each other (lossy toward Int), numbers and strings
//! convert through their decimal forms, Bool converts to 0/1, and Null
//! refuses every numeric or boolean coercion.

use std::fmt;

use maple_common::error::{MapleError, MapleResult};

use crate::parser::{DataType, Literal};

/// A runtime SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
}

impl Value {
    /// Creates a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the data type of this value, or None for NULL.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int(_) => Some(DataType::Int),
            Value::Float(_) => Some(DataType::Float),
            Value::String(_) => Some(DataType::Text),
        }
    }

    /// Name of this value's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Boolean(_) => "BOOL",
            Value::Int(_) => "INT",
            Value::Float(_) => "FLOAT",
            Value::String(_) => "TEXT",
        }
    }

    /// Coerces this value to an integer.
    pub fn as_int(&self) -> MapleResult<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::Float(f) => Ok(*f as i64),
            Value::Boolean(b) => Ok(if *b { 1 } else { 0 }),
            Value::String(s) => s.parse().map_err(|_| self.coercion_error("INT")),
            Value::Null => Err(self.coercion_error("INT")),
        }
    }

    /// Coerces this value to a float.
    pub fn as_float(&self) -> MapleResult<f64> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s.parse().map_err(|_| self.coercion_error("FLOAT")),
            Value::Null => Err(self.coercion_error("FLOAT")),
        }
    }

    /// Coerces this value to a boolean.
    pub fn as_bool(&self) -> MapleResult<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            Value::Float(f) => Ok(*f != 0.0),
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(self.coercion_error("BOOL")),
            },
            Value::Null => Err(self.coercion_error("BOOL")),
        }
    }

    /// Coerces this value to its string form. Never fails; NULL renders
    /// as `NULL`.
    pub fn as_string(&self) -> String {
        self.to_string()
    }

    /// SQL equality.
    ///
    /// Values of the same type compare by payload; Int and Float
    /// compare numerically; a String decimally parsing to the other
    /// numeric side compares numerically. NULL equals nothing, itself
    /// included.
    pub fn sql_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::String(s), Value::Int(i)) | (Value::Int(i), Value::String(s)) => {
                s.parse::<i64>().map(|parsed| parsed == *i).unwrap_or(false)
            }
            (Value::String(s), Value::Float(f)) | (Value::Float(f), Value::String(s)) => {
                s.parse::<f64>().map(|parsed| parsed == *f).unwrap_or(false)
            }
            _ => false,
        }
    }

    /// Creates a Value from a parsed literal.
    pub fn from_literal(lit: &Literal) -> Self {
        match lit {
            Literal::Null => Value::Null,
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Integer(i) => Value::Int(*i),
            Literal::Float(f) => Value::Float(*f),
            Literal::String(s) => Value::String(s.clone()),
        }
    }

    fn coercion_error(&self, target: &'static str) -> MapleError {
        MapleError::CoercionFailed {
            value: self.to_string(),
            target,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s}"),
        }
    }
}
