//! Table catalog.
//!
//! The in-memory map from table names to schemas and tree roots, plus
//! the codec that persists it into page 1 of the catalog file:
//!
//! ```text
//! num_tables: u32 LE
//! repeated num_tables times:
//!   name_len: u32 LE, name bytes
//!   root_page_id: u32 LE
//!   schema_len: u32 LE, schema bytes (JSON)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use maple_common::constants::PAGE_SIZE;
use maple_common::error::{MapleError, MapleResult};
use maple_common::types::PageId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::parser::{ColumnDef, Constraint, DataType};

use super::error::{StorageError, StorageResult};

/// One column of a table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// Declared type.
    pub data_type: DataType,
    /// Declared constraints.
    pub constraints: Vec<Constraint>,
}

impl ColumnDefinition {
    /// Creates a column definition.
    pub fn new(
        name: impl Into<String>,
        data_type: DataType,
        constraints: Vec<Constraint>,
    ) -> Self {
        Self {
            name: name.into(),
            data_type,
            constraints,
        }
    }

    /// Returns true if the column carries the given constraint.
    pub fn has_constraint(&self, constraint: Constraint) -> bool {
        self.constraints.contains(&constraint)
    }
}

impl From<ColumnDef> for ColumnDefinition {
    fn from(def: ColumnDef) -> Self {
        Self {
            name: def.name,
            data_type: def.data_type,
            constraints: def.constraints,
        }
    }
}

/// An immutable table schema: the table name and its columns in
/// declaration order.
///
/// Column lookups go by name through [`TableSchema::index_of`]; rows
/// are positional against the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    columns: Vec<ColumnDefinition>,
}

impl TableSchema {
    /// Creates a schema, validating that column names are unique.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<ColumnDefinition>,
    ) -> MapleResult<Self> {
        let name = name.into();
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(MapleError::DuplicateColumn {
                    column: column.name.clone(),
                    table: name,
                });
            }
        }
        Ok(Self { name, columns })
    }

    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the columns in declaration order.
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns the position of the named column.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Returns true if the named column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Returns the declared type of the named column.
    pub fn column_type(&self, name: &str) -> Option<DataType> {
        self.index_of(name).map(|i| self.columns[i].data_type)
    }

    /// Returns the positions of the primary-key columns, in declaration
    /// order. Empty when the table has no primary key.
    pub fn primary_key_indices(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.has_constraint(Constraint::PrimaryKey))
            .map(|(i, _)| i)
            .collect()
    }

    /// Returns every column name in declaration order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// A catalog entry: the schema plus where the table's tree lives.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// The table schema.
    pub schema: Arc<TableSchema>,
    /// Root page of the table's B+-tree, as last persisted.
    pub root_page_id: PageId,
}

/// The in-memory catalog: table name to schema and tree root.
///
/// DDL takes the writer lock, DML and queries take the reader.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: RwLock<HashMap<String, CatalogEntry>>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table.
    pub fn create_table(
        &self,
        schema: Arc<TableSchema>,
        root_page_id: PageId,
    ) -> MapleResult<()> {
        let mut tables = self.tables.write();
        if tables.contains_key(schema.name()) {
            return Err(MapleError::TableExists {
                table: schema.name().to_string(),
            });
        }
        tables.insert(
            schema.name().to_string(),
            CatalogEntry {
                schema,
                root_page_id,
            },
        );
        Ok(())
    }

    /// Removes a table.
    pub fn drop_table(&self, name: &str) -> MapleResult<CatalogEntry> {
        self.tables
            .write()
            .remove(name)
            .ok_or_else(|| MapleError::TableNotFound {
                table: name.to_string(),
            })
    }

    /// Returns the schema of the named table.
    pub fn get_table(&self, name: &str) -> Option<Arc<TableSchema>> {
        self.tables.read().get(name).map(|e| e.schema.clone())
    }

    /// Returns true if the table exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }

    /// Lists all table names.
    pub fn list_tables(&self) -> Vec<String> {
        self.tables.read().keys().cloned().collect()
    }

    /// Returns the number of tables.
    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    /// Returns true if no tables exist.
    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }

    /// Records the persisted root page of a table's tree.
    pub fn set_root(&self, name: &str, root_page_id: PageId) {
        if let Some(entry) = self.tables.write().get_mut(name) {
            entry.root_page_id = root_page_id;
        }
    }

    /// Snapshots every entry, sorted by table name for a deterministic
    /// on-disk layout.
    pub fn entries(&self) -> Vec<(String, CatalogEntry)> {
        let mut entries: Vec<_> = self
            .tables
            .read()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

/// Encodes catalog entries into catalog-page bytes.
pub fn encode_catalog(entries: &[(String, CatalogEntry)]) -> StorageResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(256);
    buf.extend_from_slice(&(entries.len() as u32).to_le_bytes());

    for (name, entry) in entries {
        let schema_json = serde_json::to_vec(entry.schema.as_ref())?;

        buf.extend_from_slice(&(name.len() as u32).to_le_bytes());
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(&entry.root_page_id.to_le_bytes());
        buf.extend_from_slice(&(schema_json.len() as u32).to_le_bytes());
        buf.extend_from_slice(&schema_json);
    }

    if buf.len() > PAGE_SIZE {
        return Err(StorageError::CatalogOverflow { size: buf.len() });
    }
    Ok(buf)
}

/// Decodes catalog entries from catalog-page bytes.
pub fn decode_catalog(data: &[u8]) -> StorageResult<Vec<(String, CatalogEntry)>> {
    let mut offset = 0usize;
    let num_tables = read_u32(data, &mut offset)?;

    let mut entries = Vec::with_capacity(num_tables as usize);
    for _ in 0..num_tables {
        let name_len = read_u32(data, &mut offset)? as usize;
        let name = read_bytes(data, &mut offset, name_len)?;
        let name = String::from_utf8(name.to_vec())
            .map_err(|_| StorageError::decode("table name is not UTF-8"))?;

        let root_page_id = PageId::new(read_u32(data, &mut offset)?);

        let schema_len = read_u32(data, &mut offset)? as usize;
        let schema_json = read_bytes(data, &mut offset, schema_len)?;
        let schema: TableSchema = serde_json::from_slice(schema_json)?;

        entries.push((
            name,
            CatalogEntry {
                schema: Arc::new(schema),
                root_page_id,
            },
        ));
    }

    Ok(entries)
}

fn read_u32(data: &[u8], offset: &mut usize) -> StorageResult<u32> {
    if *offset + 4 > data.len() {
        return Err(StorageError::decode("catalog page truncated"));
    }
    let value = u32::from_le_bytes(data[*offset..*offset + 4].try_into().unwrap());
    *offset += 4;
    Ok(value)
}

fn read_bytes<'a>(data: &'a [u8], offset: &mut usize, len: usize) -> StorageResult<&'a [u8]> {
    if *offset + len > data.len() {
        return Err(StorageError::decode("catalog page truncated"));
    }
    let bytes = &data[*offset..*offset + len];
    *offset += len;
    Ok(bytes)
}
