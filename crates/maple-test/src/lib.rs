//! Test helpers for MapleDB integration tests.

use maple_sql::{Database, ExecuteResult, Row};

/// Executes a statement, panicking with the statement text on failure.
pub fn exec(db: &Database, sql: &str) -> ExecuteResult {
    match db.execute(sql) {
        Ok(result) => result,
        Err(err) => panic!("statement failed: {sql}: {err}"),
    }
}

/// Executes a statement expected to affect rows; returns the count.
pub fn exec_affected(db: &Database, sql: &str) -> u64 {
    exec(db, sql)
        .rows_affected()
        .unwrap_or_else(|| panic!("expected an affected-rows result for: {sql}"))
}

/// Executes a SELECT; returns its rows.
pub fn query(db: &Database, sql: &str) -> Vec<Row> {
    exec(db, sql)
        .into_rows()
        .unwrap_or_else(|| panic!("expected a row set for: {sql}"))
        .into_rows()
}
