//! Statement execution.
//!
//! The executor binds parsed statements to the catalog and the table
//! stores: it validates columns, arity, constraints, and types, builds
//! positional rows, synthesizes WHERE predicates, and dispatches to the
//! storage engine.

mod evaluator;
mod row;
mod value;

pub use evaluator::{build_predicate, eval_expr, RowPredicate};
pub use row::Row;
pub use value::Value;

use std::sync::Arc;

use maple_common::error::{MapleError, MapleResult};

use crate::parser::{
    Constraint, CreateTableStatement, DeleteStatement, InsertStatement, Literal, Projection,
    SelectStatement, Statement, UpdateStatement,
};
use crate::storage::{ColumnDefinition, StorageEngine, TableSchema};

/// The result of executing one statement.
#[derive(Debug)]
pub enum ExecuteResult {
    /// DDL or DML: the number of rows affected (0 for DDL).
    Affected(u64),
    /// SELECT: column names plus the matching rows.
    Rows(QueryRows),
}

impl ExecuteResult {
    /// Returns the affected-row count, if this is not a row set.
    pub fn rows_affected(&self) -> Option<u64> {
        match self {
            ExecuteResult::Affected(count) => Some(*count),
            ExecuteResult::Rows(_) => None,
        }
    }

    /// Returns the row set, if any.
    pub fn into_rows(self) -> Option<QueryRows> {
        match self {
            ExecuteResult::Rows(rows) => Some(rows),
            ExecuteResult::Affected(_) => None,
        }
    }
}

/// A materialized query result: column names and rows in row-id order.
///
/// Rows are materialized when the statement executes, so the result is
/// a stable snapshot regardless of later writes.
#[derive(Debug)]
pub struct QueryRows {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl QueryRows {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Returns the projected column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no rows matched.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the rows as a slice.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consumes the result, returning the rows.
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl IntoIterator for QueryRows {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// Executes parsed statements against a storage engine.
pub struct Executor {
    engine: Arc<StorageEngine>,
}

impl Executor {
    /// Creates an executor over the given engine.
    pub fn new(engine: Arc<StorageEngine>) -> Self {
        Self { engine }
    }

    /// Executes one statement.
    pub fn execute(&self, stmt: Statement) -> MapleResult<ExecuteResult> {
        match stmt {
            Statement::CreateTable(stmt) => self.execute_create(stmt),
            Statement::DropTable(stmt) => {
                self.engine.drop_table(&stmt.table)?;
                Ok(ExecuteResult::Affected(0))
            }
            Statement::Insert(stmt) => self.execute_insert(stmt),
            Statement::Update(stmt) => self.execute_update(stmt),
            Statement::Delete(stmt) => self.execute_delete(stmt),
            Statement::Select(stmt) => self.execute_select(stmt),
        }
    }

    fn execute_create(&self, stmt: CreateTableStatement) -> MapleResult<ExecuteResult> {
        let columns = stmt
            .columns
            .into_iter()
            .map(ColumnDefinition::from)
            .collect();
        let schema = TableSchema::new(stmt.table, columns)?;
        self.engine.create_table(schema)?;
        Ok(ExecuteResult::Affected(0))
    }

    fn execute_insert(&self, stmt: InsertStatement) -> MapleResult<ExecuteResult> {
        let schema = self.engine.schema(&stmt.table)?;

        // Resolve the target columns: an omitted list means every
        // column in declaration order.
        let targets: Vec<usize> = if stmt.columns.is_empty() {
            (0..schema.num_columns()).collect()
        } else {
            stmt.columns
                .iter()
                .map(|name| {
                    schema
                        .index_of(name)
                        .ok_or_else(|| column_not_found(name, &stmt.table))
                })
                .collect::<MapleResult<_>>()?
        };

        // Rows are independent: earlier rows stay applied when a later
        // one fails, and the error carries how many were applied.
        let multi_row = stmt.rows.len() > 1;
        let mut applied = 0u64;
        for tuple in &stmt.rows {
            match self.insert_one(&stmt.table, &schema, &targets, tuple) {
                Ok(()) => applied += 1,
                Err(err) if multi_row => {
                    return Err(MapleError::PartialInsert {
                        applied,
                        source: Box::new(err),
                    })
                }
                Err(err) => return Err(err),
            }
        }

        Ok(ExecuteResult::Affected(applied))
    }

    fn insert_one(
        &self,
        table: &str,
        schema: &Arc<TableSchema>,
        targets: &[usize],
        tuple: &[Literal],
    ) -> MapleResult<()> {
        if tuple.len() != targets.len() {
            return Err(MapleError::ArityMismatch {
                expected: targets.len(),
                actual: tuple.len(),
            });
        }

        let mut row = Row::nulls(schema.num_columns());
        for (literal, &idx) in tuple.iter().zip(targets) {
            let value = Value::from_literal(literal);
            let value = coerce_for_column(value, &schema.columns()[idx])?;
            row.set(idx, value);
        }

        for (idx, column) in schema.columns().iter().enumerate() {
            if column.has_constraint(Constraint::NotNull)
                && row.get(idx).is_some_and(Value::is_null)
            {
                return Err(MapleError::NotNullViolation {
                    column: column.name.clone(),
                });
            }
        }

        self.engine.insert(table, row)
    }

    fn execute_update(&self, stmt: UpdateStatement) -> MapleResult<ExecuteResult> {
        let schema = self.engine.schema(&stmt.table)?;

        // SET right-hand sides evaluate in an empty row context:
        // literals in practice; column references come out NULL.
        let mut assignments = Vec::with_capacity(stmt.assignments.len());
        for (name, expr) in stmt.assignments {
            let idx = schema
                .index_of(&name)
                .ok_or_else(|| column_not_found(&name, &stmt.table))?;
            let column = &schema.columns()[idx];

            let value = eval_expr(&expr, None, &schema)?;
            let value = coerce_for_column(value, column)?;
            if value.is_null() && column.has_constraint(Constraint::NotNull) {
                return Err(MapleError::NotNullViolation {
                    column: column.name.clone(),
                });
            }
            assignments.push((idx, value));
        }

        let predicate = build_predicate(stmt.selection, schema);
        let count = self.engine.update(&stmt.table, &assignments, &*predicate)?;
        Ok(ExecuteResult::Affected(count))
    }

    fn execute_delete(&self, stmt: DeleteStatement) -> MapleResult<ExecuteResult> {
        let schema = self.engine.schema(&stmt.table)?;
        let predicate = build_predicate(stmt.selection, schema);
        let count = self.engine.delete(&stmt.table, &*predicate)?;
        Ok(ExecuteResult::Affected(count))
    }

    fn execute_select(&self, stmt: SelectStatement) -> MapleResult<ExecuteResult> {
        let schema = self.engine.schema(&stmt.table)?;

        let (columns, projection) = match stmt.projection {
            Projection::All => (schema.column_names(), None),
            Projection::Columns(names) => {
                let indices = names
                    .iter()
                    .map(|name| {
                        schema
                            .index_of(name)
                            .ok_or_else(|| column_not_found(name, &stmt.table))
                    })
                    .collect::<MapleResult<Vec<_>>>()?;
                (names, Some(indices))
            }
        };

        let predicate = build_predicate(stmt.selection, schema);
        let rows = self
            .engine
            .select(&stmt.table, projection.as_deref(), &*predicate)?;

        Ok(ExecuteResult::Rows(QueryRows::new(columns, rows)))
    }
}

/// Checks a value against a column's declared type.
///
/// NULL passes (NOT NULL is enforced separately); integer literals
/// widen losslessly into FLOAT columns; everything else must match the
/// declared type exactly.
fn coerce_for_column(value: Value, column: &ColumnDefinition) -> MapleResult<Value> {
    let actual = match value.data_type() {
        None => return Ok(value),
        Some(data_type) => data_type,
    };

    if actual == column.data_type {
        return Ok(value);
    }
    if let (crate::parser::DataType::Float, Value::Int(i)) = (column.data_type, &value) {
        return Ok(Value::Float(*i as f64));
    }

    Err(MapleError::TypeMismatch {
        column: column.name.clone(),
        expected: column.data_type.to_string(),
        actual: value.type_name().to_string(),
    })
}

fn column_not_found(column: &str, table: &str) -> MapleError {
    MapleError::ColumnNotFound {
        column: column.to_string(),
        table: table.to_string(),
    }
}
