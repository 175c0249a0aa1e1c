//! SQL parser for MapleDB.
//!
//! Parsing is delegated to the `sqlparser` crate (PostgreSQL dialect);
//! the resulting AST is translated into MapleDB's internal statement
//! and expression types. Only the supported subset survives the
//! translation:
//!
//! - `CREATE TABLE name (col type [PRIMARY KEY|NOT NULL|UNIQUE] ...)`
//! - `DROP TABLE name`
//! - `INSERT INTO name [(cols)] VALUES (literals), ...`
//! - `UPDATE name SET col = literal, ... [WHERE expr]`
//! - `DELETE FROM name [WHERE expr]`
//! - `SELECT * | cols FROM name [WHERE expr]`
//!
//! where `expr` is `column = literal` terms combined with AND/OR.
//! Keywords are case-insensitive and the trailing semicolon is
//! optional.
//!
//! # Usage
//!
//! ```
//! use maple_sql::parser::{Parser, Statement};
//!
//! let stmt = Parser::parse_one("SELECT id, name FROM users WHERE id = 1").unwrap();
//! assert!(matches!(stmt, Statement::Select(_)));
//! ```

mod expr;
mod statement;
mod types;

pub use expr::{BinaryOperator, Expr};
pub use statement::{
    ColumnDef, CreateTableStatement, DeleteStatement, DropTableStatement, InsertStatement,
    Projection, SelectStatement, Statement, UpdateStatement,
};
pub use types::{Constraint, DataType, Literal};

use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser as SqlParser;
use thiserror::Error;

/// Errors that can occur during SQL parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The text is not recognizable SQL.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Valid SQL outside the supported subset.
    #[error("unsupported SQL feature: {0}")]
    Unsupported(String),

    /// A malformed literal value.
    #[error("invalid literal: {0}")]
    InvalidLiteral(String),

    /// Empty input.
    #[error("empty query")]
    EmptyQuery,
}

impl From<sqlparser::parser::ParserError> for ParseError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        ParseError::Syntax(err.to_string())
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// SQL parser for MapleDB.
pub struct Parser;

impl Parser {
    /// Parses a SQL string into a list of statements.
    pub fn parse(sql: &str) -> ParseResult<Vec<Statement>> {
        if sql.trim().is_empty() {
            return Err(ParseError::EmptyQuery);
        }

        let dialect = PostgreSqlDialect {};
        let ast = SqlParser::parse_sql(&dialect, sql)?;

        if ast.is_empty() {
            return Err(ParseError::EmptyQuery);
        }

        ast.into_iter().map(Statement::from_sql_ast).collect()
    }

    /// Parses exactly one SQL statement.
    pub fn parse_one(sql: &str) -> ParseResult<Statement> {
        let mut statements = Self::parse(sql)?;
        if statements.len() != 1 {
            return Err(ParseError::Syntax(format!(
                "expected 1 statement, got {}",
                statements.len()
            )));
        }
        Ok(statements.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_table() {
        let stmt = Parser::parse_one(
            "CREATE TABLE users (id INT PRIMARY KEY, name TEXT NOT NULL, score FLOAT, ok BOOL)",
        )
        .unwrap();

        let create = match stmt {
            Statement::CreateTable(create) => create,
            other => panic!("expected CREATE TABLE, got {other:?}"),
        };

        assert_eq!(create.table, "users");
        assert_eq!(create.columns.len(), 4);
        assert_eq!(create.columns[0].name, "id");
        assert_eq!(create.columns[0].data_type, DataType::Int);
        assert!(create.columns[0].has_constraint(Constraint::PrimaryKey));
        assert!(create.columns[1].has_constraint(Constraint::NotNull));
        assert_eq!(create.columns[2].data_type, DataType::Float);
        assert_eq!(create.columns[3].data_type, DataType::Boolean);
    }

    #[test]
    fn test_parse_create_table_type_synonyms() {
        let stmt = Parser::parse_one(
            "create table t (a integer, b real, c double, d varchar, e char, f boolean)",
        )
        .unwrap();

        let create = match stmt {
            Statement::CreateTable(create) => create,
            other => panic!("expected CREATE TABLE, got {other:?}"),
        };

        let types: Vec<DataType> = create.columns.iter().map(|c| c.data_type).collect();
        assert_eq!(
            types,
            vec![
                DataType::Int,
                DataType::Float,
                DataType::Float,
                DataType::Text,
                DataType::Text,
                DataType::Boolean,
            ]
        );
    }

    #[test]
    fn test_parse_composite_primary_key() {
        let stmt = Parser::parse_one(
            "CREATE TABLE people (first TEXT PRIMARY KEY, last TEXT PRIMARY KEY, age INT)",
        )
        .unwrap();

        let create = match stmt {
            Statement::CreateTable(create) => create,
            other => panic!("expected CREATE TABLE, got {other:?}"),
        };

        assert!(create.columns[0].has_constraint(Constraint::PrimaryKey));
        assert!(create.columns[1].has_constraint(Constraint::PrimaryKey));
        assert!(!create.columns[2].has_constraint(Constraint::PrimaryKey));
    }

    #[test]
    fn test_parse_drop_table() {
        let stmt = Parser::parse_one("DROP TABLE users;").unwrap();
        assert_eq!(
            stmt,
            Statement::DropTable(DropTableStatement {
                table: "users".into()
            })
        );
    }

    #[test]
    fn test_parse_insert_with_columns() {
        let stmt =
            Parser::parse_one("INSERT INTO t (id, name) VALUES (1, 'a'), (2, 'b')").unwrap();

        let insert = match stmt {
            Statement::Insert(insert) => insert,
            other => panic!("expected INSERT, got {other:?}"),
        };

        assert_eq!(insert.table, "t");
        assert_eq!(insert.columns, vec!["id".to_string(), "name".to_string()]);
        assert_eq!(insert.rows.len(), 2);
        assert_eq!(
            insert.rows[0],
            vec![Literal::Integer(1), Literal::String("a".into())]
        );
    }

    #[test]
    fn test_parse_insert_without_columns() {
        let stmt = Parser::parse_one("INSERT INTO t VALUES (1, 2.5, TRUE, NULL)").unwrap();

        let insert = match stmt {
            Statement::Insert(insert) => insert,
            other => panic!("expected INSERT, got {other:?}"),
        };

        assert!(insert.columns.is_empty());
        assert_eq!(
            insert.rows[0],
            vec![
                Literal::Integer(1),
                Literal::Float(2.5),
                Literal::Boolean(true),
                Literal::Null,
            ]
        );
    }

    #[test]
    fn test_parse_negative_literal() {
        let stmt = Parser::parse_one("INSERT INTO t VALUES (-5, -1.5)").unwrap();

        let insert = match stmt {
            Statement::Insert(insert) => insert,
            other => panic!("expected INSERT, got {other:?}"),
        };

        assert_eq!(
            insert.rows[0],
            vec![Literal::Integer(-5), Literal::Float(-1.5)]
        );
    }

    #[test]
    fn test_parse_update() {
        let stmt = Parser::parse_one("UPDATE t SET name = 'b', age = 3 WHERE id = 1").unwrap();

        let update = match stmt {
            Statement::Update(update) => update,
            other => panic!("expected UPDATE, got {other:?}"),
        };

        assert_eq!(update.table, "t");
        assert_eq!(update.assignments.len(), 2);
        assert_eq!(update.assignments[0].0, "name");
        assert!(update.selection.is_some());
    }

    #[test]
    fn test_parse_update_without_where() {
        let stmt = Parser::parse_one("UPDATE t SET age = 3").unwrap();
        let update = match stmt {
            Statement::Update(update) => update,
            other => panic!("expected UPDATE, got {other:?}"),
        };
        assert!(update.selection.is_none());
    }

    #[test]
    fn test_parse_delete() {
        let stmt = Parser::parse_one("DELETE FROM t WHERE id = 1").unwrap();
        let delete = match stmt {
            Statement::Delete(delete) => delete,
            other => panic!("expected DELETE, got {other:?}"),
        };
        assert_eq!(delete.table, "t");
        assert!(delete.selection.is_some());
    }

    #[test]
    fn test_parse_select_wildcard() {
        let stmt = Parser::parse_one("SELECT * FROM t").unwrap();
        let select = match stmt {
            Statement::Select(select) => select,
            other => panic!("expected SELECT, got {other:?}"),
        };
        assert_eq!(select.projection, Projection::All);
        assert!(select.selection.is_none());
    }

    #[test]
    fn test_parse_select_columns_and_where() {
        let stmt = Parser::parse_one("SELECT id, name FROM t WHERE name = 'x'").unwrap();
        let select = match stmt {
            Statement::Select(select) => select,
            other => panic!("expected SELECT, got {other:?}"),
        };
        assert_eq!(
            select.projection,
            Projection::Columns(vec!["id".into(), "name".into()])
        );
        let expr = select.selection.unwrap();
        assert_eq!(expr.to_string(), "name = 'x'");
    }

    #[test]
    fn test_parse_select_conjunction() {
        let stmt =
            Parser::parse_one("SELECT * FROM t WHERE first = 'J' AND last = 'D'").unwrap();
        let select = match stmt {
            Statement::Select(select) => select,
            other => panic!("expected SELECT, got {other:?}"),
        };
        assert_eq!(
            select.selection.unwrap().to_string(),
            "first = 'J' AND last = 'D'"
        );
    }

    #[test]
    fn test_parse_empty_query() {
        assert!(matches!(Parser::parse("  "), Err(ParseError::EmptyQuery)));
    }

    #[test]
    fn test_parse_unsupported_features() {
        assert!(matches!(
            Parser::parse_one("SELECT * FROM a JOIN b ON a.id = b.id"),
            Err(ParseError::Unsupported(_))
        ));
        assert!(matches!(
            Parser::parse_one("SELECT * FROM t ORDER BY id"),
            Err(ParseError::Unsupported(_))
        ));
        assert!(matches!(
            Parser::parse_one("SELECT * FROM t WHERE id < 3"),
            Err(ParseError::Unsupported(_))
        ));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            Parser::parse_one("FLORP THE WOBBLE"),
            Err(ParseError::Syntax(_))
        ));
    }
}
