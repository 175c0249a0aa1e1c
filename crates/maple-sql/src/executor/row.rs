//! Row representation.
//!
//! A row is a positional vector of values aligned with its table
//! schema's column order; the schema owns the name-to-index mapping.

use std::fmt;

use super::Value;

/// A single row of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Creates a row from values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Creates a row of `num_columns` NULLs.
    pub fn nulls(num_columns: usize) -> Self {
        Self {
            values: vec![Value::Null; num_columns],
        }
    }

    /// Returns the number of columns.
    pub fn num_columns(&self) -> usize {
        self.values.len()
    }

    /// Returns the value at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Sets the value at `index`.
    pub fn set(&mut self, index: usize, value: Value) {
        if index < self.values.len() {
            self.values[index] = value;
        }
    }

    /// Returns the values as a slice.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consumes the row, returning its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Projects the row to the given column indices.
    ///
    /// Out-of-range indices project as NULL.
    pub fn project(&self, indices: &[usize]) -> Row {
        let values = indices
            .iter()
            .map(|&i| self.values.get(i).cloned().unwrap_or(Value::Null))
            .collect();
        Row { values }
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_access() {
        let mut row = Row::new(vec![Value::Int(1), Value::string("a")]);
        assert_eq!(row.num_columns(), 2);
        assert_eq!(row.get(0), Some(&Value::Int(1)));
        assert_eq!(row.get(5), None);

        row.set(1, Value::string("b"));
        assert_eq!(row.get(1), Some(&Value::string("b")));
    }

    #[test]
    fn test_row_project() {
        let row = Row::new(vec![Value::Int(1), Value::string("a"), Value::Boolean(true)]);
        let projected = row.project(&[2, 0]);
        assert_eq!(
            projected.values(),
            &[Value::Boolean(true), Value::Int(1)]
        );
    }

    #[test]
    fn test_row_nulls() {
        let row = Row::nulls(3);
        assert!(row.values().iter().all(Value::is_null));
    }

    #[test]
    fn test_row_display() {
        let row = Row::new(vec![Value::Int(1), Value::Null]);
        assert_eq!(row.to_string(), "(1, NULL)");
    }
}
