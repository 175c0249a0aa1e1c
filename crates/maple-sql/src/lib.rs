//! # MapleDB SQL Layer
//!
//! Binds SQL statements to the paged storage engine: a parser producing
//! a typed AST, an executor dispatching statements, a catalog of table
//! schemas persisted through the page manager, and a per-table store
//! mapping rows onto B+-tree entries.
//!
//! The public entry point is [`Database`]:
//!
//! ```no_run
//! use maple_sql::Database;
//!
//! let db = Database::open("./data").unwrap();
//! db.execute("CREATE TABLE users (id INT PRIMARY KEY, name TEXT)").unwrap();
//! db.execute("INSERT INTO users (id, name) VALUES (1, 'ada')").unwrap();
//! let result = db.execute("SELECT name FROM users WHERE id = 1").unwrap();
//! db.close().unwrap();
//! ```

mod database;
pub mod executor;
pub mod parser;
pub mod storage;

pub use database::{Database, ExecuteResult, QueryRows};
pub use executor::{Row, Value};
pub use parser::{DataType, Parser, Statement};
