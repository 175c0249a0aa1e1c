//! SQL statement representation.
//!
//! Statements arrive from sqlparser's AST and are converted into the
//! sum types below; the executor pattern-matches on [`Statement`]
//! directly.

use sqlparser::ast as sql_ast;

use super::expr::Expr;
use super::types::{Constraint, DataType, Literal};
use super::{ParseError, ParseResult};

/// A parsed SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// CREATE TABLE.
    CreateTable(CreateTableStatement),
    /// DROP TABLE.
    DropTable(DropTableStatement),
    /// INSERT.
    Insert(InsertStatement),
    /// UPDATE.
    Update(UpdateStatement),
    /// DELETE.
    Delete(DeleteStatement),
    /// SELECT.
    Select(SelectStatement),
}

impl Statement {
    /// Converts from sqlparser's Statement.
    pub fn from_sql_ast(stmt: sql_ast::Statement) -> ParseResult<Self> {
        match stmt {
            sql_ast::Statement::CreateTable {
                name,
                columns,
                constraints,
                ..
            } => Ok(Statement::CreateTable(CreateTableStatement::from_parts(
                name,
                columns,
                constraints,
            )?)),
            sql_ast::Statement::Drop {
                object_type: sql_ast::ObjectType::Table,
                names,
                ..
            } => {
                let name = names
                    .into_iter()
                    .next()
                    .ok_or_else(|| ParseError::Syntax("DROP TABLE without a name".into()))?;
                Ok(Statement::DropTable(DropTableStatement {
                    table: table_name(&name)?,
                }))
            }
            sql_ast::Statement::Insert {
                table_name,
                columns,
                source,
                ..
            } => Ok(Statement::Insert(InsertStatement::from_parts(
                table_name, columns, source,
            )?)),
            sql_ast::Statement::Update {
                table,
                assignments,
                selection,
                ..
            } => Ok(Statement::Update(UpdateStatement::from_parts(
                table,
                assignments,
                selection,
            )?)),
            sql_ast::Statement::Delete {
                from, selection, ..
            } => Ok(Statement::Delete(DeleteStatement::from_parts(
                from, selection,
            )?)),
            sql_ast::Statement::Query(query) => {
                Ok(Statement::Select(SelectStatement::from_sql_ast(*query)?))
            }
            other => Err(ParseError::Unsupported(format!("statement {other}"))),
        }
    }
}

/// A column definition in CREATE TABLE.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Declared type.
    pub data_type: DataType,
    /// Declared constraints, in declaration order.
    pub constraints: Vec<Constraint>,
}

impl ColumnDef {
    /// Returns true if the column carries the given constraint.
    pub fn has_constraint(&self, constraint: Constraint) -> bool {
        self.constraints.contains(&constraint)
    }
}

/// CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    /// Table name.
    pub table: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDef>,
}

impl CreateTableStatement {
    fn from_parts(
        name: sql_ast::ObjectName,
        columns: Vec<sql_ast::ColumnDef>,
        constraints: Vec<sql_ast::TableConstraint>,
    ) -> ParseResult<Self> {
        if !constraints.is_empty() {
            return Err(ParseError::Unsupported(
                "table-level constraints".to_string(),
            ));
        }

        let table = table_name(&name)?;
        let columns = columns
            .into_iter()
            .map(column_def)
            .collect::<ParseResult<Vec<_>>>()?;

        if columns.is_empty() {
            return Err(ParseError::Syntax(format!(
                "table '{table}' has no columns"
            )));
        }

        Ok(Self { table, columns })
    }
}

/// DROP TABLE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStatement {
    /// Table name.
    pub table: String,
}

/// INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Target table.
    pub table: String,
    /// Explicit column list; empty means every column in declaration
    /// order.
    pub columns: Vec<String>,
    /// One literal tuple per row.
    pub rows: Vec<Vec<Literal>>,
}

impl InsertStatement {
    fn from_parts(
        table_name: sql_ast::ObjectName,
        columns: Vec<sql_ast::Ident>,
        source: Option<Box<sql_ast::Query>>,
    ) -> ParseResult<Self> {
        let table = self::table_name(&table_name)?;
        let columns = columns.into_iter().map(|ident| ident.value).collect();

        let source =
            source.ok_or_else(|| ParseError::Unsupported("INSERT without VALUES".into()))?;
        let rows = match *source.body {
            sql_ast::SetExpr::Values(values) => values
                .rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|expr| Expr::from_sql_ast(expr)?.into_literal())
                        .collect::<ParseResult<Vec<_>>>()
                })
                .collect::<ParseResult<Vec<_>>>()?,
            _ => {
                return Err(ParseError::Unsupported(
                    "INSERT source other than VALUES".to_string(),
                ))
            }
        };

        if rows.is_empty() {
            return Err(ParseError::Syntax("INSERT with no value rows".into()));
        }

        Ok(Self {
            table,
            columns,
            rows,
        })
    }
}

/// UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    /// Target table.
    pub table: String,
    /// SET assignments: column name and its new-value expression.
    pub assignments: Vec<(String, Expr)>,
    /// WHERE clause; None means every row.
    pub selection: Option<Expr>,
}

impl UpdateStatement {
    fn from_parts(
        table: sql_ast::TableWithJoins,
        assignments: Vec<sql_ast::Assignment>,
        selection: Option<sql_ast::Expr>,
    ) -> ParseResult<Self> {
        let table = table_from_relation(table)?;

        let assignments = assignments
            .into_iter()
            .map(|assignment| {
                let column = single_ident(assignment.id)?;
                let value = Expr::from_sql_ast(assignment.value)?;
                Ok((column, value))
            })
            .collect::<ParseResult<Vec<_>>>()?;

        let selection = selection.map(Expr::from_sql_ast).transpose()?;

        Ok(Self {
            table,
            assignments,
            selection,
        })
    }
}

/// DELETE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    /// Target table.
    pub table: String,
    /// WHERE clause; None means every row.
    pub selection: Option<Expr>,
}

impl DeleteStatement {
    fn from_parts(
        from: Vec<sql_ast::TableWithJoins>,
        selection: Option<sql_ast::Expr>,
    ) -> ParseResult<Self> {
        let table = from
            .into_iter()
            .next()
            .ok_or_else(|| ParseError::Syntax("DELETE without FROM".into()))?;
        let table = table_from_relation(table)?;
        let selection = selection.map(Expr::from_sql_ast).transpose()?;

        Ok(Self { table, selection })
    }
}

/// Column projection of a SELECT.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `SELECT *`.
    All,
    /// Named columns.
    Columns(Vec<String>),
}

/// SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Source table.
    pub table: String,
    /// Projected columns.
    pub projection: Projection,
    /// WHERE clause; None means every row.
    pub selection: Option<Expr>,
}

impl SelectStatement {
    /// Converts from sqlparser's Query.
    pub fn from_sql_ast(query: sql_ast::Query) -> ParseResult<Self> {
        if query.with.is_some() {
            return Err(ParseError::Unsupported("WITH".to_string()));
        }
        if !query.order_by.is_empty() {
            return Err(ParseError::Unsupported("ORDER BY".to_string()));
        }
        if query.limit.is_some() || query.offset.is_some() {
            return Err(ParseError::Unsupported("LIMIT/OFFSET".to_string()));
        }

        let select = match *query.body {
            sql_ast::SetExpr::Select(select) => select,
            _ => {
                return Err(ParseError::Unsupported(
                    "non-SELECT set expression".to_string(),
                ))
            }
        };

        if select.distinct.is_some() {
            return Err(ParseError::Unsupported("DISTINCT".to_string()));
        }
        if !select.group_by_is_empty() {
            return Err(ParseError::Unsupported("GROUP BY".to_string()));
        }
        if select.having.is_some() {
            return Err(ParseError::Unsupported("HAVING".to_string()));
        }

        let table = select
            .from
            .into_iter()
            .next()
            .ok_or_else(|| ParseError::Syntax("SELECT without FROM".into()))?;
        let table = table_from_relation(table)?;

        let mut columns = Vec::with_capacity(select.projection.len());
        let mut wildcard = false;
        for item in select.projection {
            match item {
                sql_ast::SelectItem::Wildcard(_) => wildcard = true,
                sql_ast::SelectItem::UnnamedExpr(sql_ast::Expr::Identifier(ident)) => {
                    columns.push(ident.value)
                }
                other => {
                    return Err(ParseError::Unsupported(format!("projection {other}")))
                }
            }
        }
        let projection = if wildcard {
            if !columns.is_empty() {
                return Err(ParseError::Syntax(
                    "'*' cannot be combined with named columns".into(),
                ));
            }
            Projection::All
        } else {
            Projection::Columns(columns)
        };

        let selection = select.selection.map(Expr::from_sql_ast).transpose()?;

        Ok(Self {
            table,
            projection,
            selection,
        })
    }
}

/// Extension helper: whether a select has no GROUP BY expressions.
trait GroupByIsEmpty {
    fn group_by_is_empty(&self) -> bool;
}

impl GroupByIsEmpty for sql_ast::Select {
    fn group_by_is_empty(&self) -> bool {
        match &self.group_by {
            sql_ast::GroupByExpr::Expressions(exprs) => exprs.is_empty(),
            sql_ast::GroupByExpr::All => false,
        }
    }
}

/// Extracts a bare table name from an object name, rejecting qualified
/// paths.
fn table_name(name: &sql_ast::ObjectName) -> ParseResult<String> {
    if name.0.len() != 1 {
        return Err(ParseError::Unsupported(format!(
            "qualified table name {name}"
        )));
    }
    Ok(name.0[0].value.clone())
}

/// Extracts a bare table name from a FROM item, rejecting joins,
/// aliases, and subqueries.
fn table_from_relation(table: sql_ast::TableWithJoins) -> ParseResult<String> {
    if !table.joins.is_empty() {
        return Err(ParseError::Unsupported("JOIN".to_string()));
    }
    match table.relation {
        sql_ast::TableFactor::Table { name, alias: None, .. } => table_name(&name),
        sql_ast::TableFactor::Table { alias: Some(_), .. } => {
            Err(ParseError::Unsupported("table alias".to_string()))
        }
        other => Err(ParseError::Unsupported(format!("table factor {other}"))),
    }
}

/// Extracts a single identifier from a compound identifier list.
fn single_ident(idents: Vec<sql_ast::Ident>) -> ParseResult<String> {
    if idents.len() != 1 {
        return Err(ParseError::Unsupported(
            "qualified column in assignment".to_string(),
        ));
    }
    Ok(idents.into_iter().next().expect("length checked").value)
}

/// Converts a sqlparser column definition.
fn column_def(def: sql_ast::ColumnDef) -> ParseResult<ColumnDef> {
    let data_type = DataType::from_sql_ast(&def.data_type)?;

    let mut constraints = Vec::new();
    for option in def.options {
        match option.option {
            sql_ast::ColumnOption::Unique { is_primary: true, .. } => {
                constraints.push(Constraint::PrimaryKey)
            }
            sql_ast::ColumnOption::Unique { is_primary: false, .. } => {
                constraints.push(Constraint::Unique)
            }
            sql_ast::ColumnOption::NotNull => constraints.push(Constraint::NotNull),
            sql_ast::ColumnOption::Null => {}
            other => {
                return Err(ParseError::Unsupported(format!(
                    "column option {other}"
                )))
            }
        }
    }

    Ok(ColumnDef {
        name: def.name.value,
        data_type,
        constraints,
    })
}
