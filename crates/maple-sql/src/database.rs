//! The public database facade.
//!
//! [`Database`] wires the parser, executor, and storage engine over one
//! data directory. Statements run to completion under the engine's
//! reader/writer discipline; durability is guaranteed after a clean
//! [`Database::close`].

use std::path::Path;
use std::sync::Arc;

use maple_common::error::{MapleError, MapleResult};
use tracing::debug;

pub use crate::executor::{ExecuteResult, QueryRows};
use crate::executor::Executor;
use crate::parser::{ParseError, Parser};
use crate::storage::StorageEngine;

impl From<ParseError> for MapleError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Unsupported(feature) => MapleError::Unsupported { feature },
            other => MapleError::Syntax {
                message: other.to_string(),
            },
        }
    }
}

/// A MapleDB database over a data directory.
pub struct Database {
    engine: Arc<StorageEngine>,
    executor: Executor,
}

impl Database {
    /// Opens (or initializes) a database in `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> MapleResult<Self> {
        let engine = Arc::new(StorageEngine::open(data_dir)?);
        let executor = Executor::new(engine.clone());
        Ok(Self { engine, executor })
    }

    /// Parses and executes one SQL statement.
    pub fn execute(&self, sql: &str) -> MapleResult<ExecuteResult> {
        debug!(sql, "execute");
        let stmt = Parser::parse_one(sql)?;
        self.executor.execute(stmt)
    }

    /// Lists the tables known to the catalog.
    pub fn list_tables(&self) -> Vec<String> {
        self.engine.list_tables()
    }

    /// Flushes every table and the catalog. Durability is guaranteed
    /// only after a clean close.
    pub fn close(&self) -> MapleResult<()> {
        self.engine.close()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("engine", &self.engine)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maple_common::error::ErrorKind;
    use tempfile::tempdir;

    #[test]
    fn test_execute_round_trip() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();

        db.execute("CREATE TABLE t (id INT PRIMARY KEY)").unwrap();
        db.execute("INSERT INTO t VALUES (1)").unwrap();

        let rows = db
            .execute("SELECT * FROM t")
            .unwrap()
            .into_rows()
            .unwrap();
        assert_eq!(rows.num_rows(), 1);

        db.close().unwrap();
    }

    #[test]
    fn test_syntax_error_kind() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();

        let err = db.execute("NOT EVEN SQL").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn test_list_tables() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();

        assert!(db.list_tables().is_empty());
        db.execute("CREATE TABLE a (x INT)").unwrap();
        db.execute("CREATE TABLE b (y INT)").unwrap();

        let mut tables = db.list_tables();
        tables.sort();
        assert_eq!(tables, vec!["a".to_string(), "b".to_string()]);
    }
}
