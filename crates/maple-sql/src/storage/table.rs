//! Per-table storage.
//!
//! A [`TableStore`] owns one paged file housing one B+-tree. Rows are
//! stored under their row-id (composite primary key, or auto-increment
//! counter) with the payload codec from [`super::encoder`]. The tree's
//! current root page id is reported upward for catalog persistence.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use maple_common::error::{MapleError, MapleResult};
use maple_common::types::{Key, PageId, Value as StorageValue};
use maple_storage::{BPlusTree, PageManager};

use crate::executor::{Row, Value};

use super::catalog::TableSchema;
use super::encoder::{decode_row, encode_row};
use super::rowid::{decode_auto, encode_auto, encode_composite};

/// A WHERE predicate applied during scans.
pub type Predicate<'a> = &'a dyn Fn(&Row) -> MapleResult<bool>;

/// One table's storage: a page manager, a B+-tree, and the row-id
/// state.
pub struct TableStore {
    schema: Arc<TableSchema>,
    pk_indices: Vec<usize>,
    pager: Arc<PageManager>,
    tree: BPlusTree,
    /// Next auto-increment row-id; meaningful only without a primary
    /// key.
    next_auto_id: u64,
    path: PathBuf,
}

impl TableStore {
    /// Creates the table file with a fresh empty tree.
    pub fn create(path: impl AsRef<Path>, schema: Arc<TableSchema>) -> MapleResult<Self> {
        let path = path.as_ref().to_path_buf();
        let pager = Arc::new(PageManager::open(&path)?);
        let tree = BPlusTree::create_new(pager.clone())?;
        let pk_indices = schema.primary_key_indices();

        Ok(Self {
            schema,
            pk_indices,
            pager,
            tree,
            next_auto_id: 1,
            path,
        })
    }

    /// Opens an existing table file with its tree rooted at `root`.
    ///
    /// For tables without a primary key, the auto-increment counter
    /// resumes past the greatest stored row-id.
    pub fn open(
        path: impl AsRef<Path>,
        schema: Arc<TableSchema>,
        root: PageId,
    ) -> MapleResult<Self> {
        let path = path.as_ref().to_path_buf();
        let pager = Arc::new(PageManager::open(&path)?);
        let tree = BPlusTree::open(pager.clone(), root)?;
        let pk_indices = schema.primary_key_indices();

        let next_auto_id = if pk_indices.is_empty() {
            tree.last_entry()?
                .and_then(|(key, _)| decode_auto(&key))
                .map(|id| id + 1)
                .unwrap_or(1)
        } else {
            1
        };

        Ok(Self {
            schema,
            pk_indices,
            pager,
            tree,
            next_auto_id,
            path,
        })
    }

    /// Returns the table schema.
    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    /// Returns the table file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the tree's current root page id.
    pub fn root_page_id(&self) -> PageId {
        self.tree.root_page_id()
    }

    /// Inserts a row under its row-id.
    ///
    /// A duplicate row-id overwrites the stored row (insert is upsert;
    /// primary keys are unique by identity, not by rejection).
    pub fn insert(&mut self, row: Row) -> MapleResult<()> {
        let key = self.row_id_for_insert(&row)?;
        let payload = StorageValue::from_vec(encode_row(&row));
        self.tree.insert(&key, &payload)?;
        Ok(())
    }

    /// Scans every row with its row-id, in row-id order.
    pub fn scan_entries(&self) -> MapleResult<Vec<(Key, Row)>> {
        let entries = self.tree.scan_all()?;
        let mut rows = Vec::with_capacity(entries.len());
        for (key, payload) in entries {
            let row = decode_row(&payload)?;
            rows.push((Key::from_vec(key), row));
        }
        Ok(rows)
    }

    /// Returns the rows matching `predicate`, projected to
    /// `projection` (None means every column), in row-id order.
    pub fn select(
        &self,
        projection: Option<&[usize]>,
        predicate: Predicate<'_>,
    ) -> MapleResult<Vec<Row>> {
        let mut results = Vec::new();
        for (_, row) in self.scan_entries()? {
            if !predicate(&row)? {
                continue;
            }
            results.push(match projection {
                Some(indices) => row.project(indices),
                None => row,
            });
        }
        Ok(results)
    }

    /// Applies `assignments` to every row matching `predicate`.
    ///
    /// Each matching row is removed under its old row-id and reinserted
    /// under the new one: rewriting a primary-key column moves the row.
    /// Returns the number of rows changed.
    pub fn update(
        &mut self,
        assignments: &[(usize, Value)],
        predicate: Predicate<'_>,
    ) -> MapleResult<u64> {
        let mut count = 0u64;
        for (old_key, row) in self.scan_entries()? {
            if !predicate(&row)? {
                continue;
            }

            let mut new_row = row;
            for (idx, value) in assignments {
                new_row.set(*idx, value.clone());
            }

            let new_key = if self.pk_indices.is_empty() {
                old_key.clone()
            } else {
                self.composite_row_id(&new_row)?
            };

            self.tree.delete(&old_key)?;
            let payload = StorageValue::from_vec(encode_row(&new_row));
            self.tree.insert(&new_key, &payload)?;
            count += 1;
        }
        Ok(count)
    }

    /// Deletes every row matching `predicate`. Returns the number of
    /// rows removed.
    pub fn delete(&mut self, predicate: Predicate<'_>) -> MapleResult<u64> {
        let mut count = 0u64;
        for (key, row) in self.scan_entries()? {
            if !predicate(&row)? {
                continue;
            }
            self.tree.delete(&key)?;
            count += 1;
        }
        Ok(count)
    }

    /// Flushes every dirty page of the table file.
    pub fn flush(&self) -> MapleResult<()> {
        self.pager.flush_all()?;
        Ok(())
    }

    /// Flushes and releases the table file.
    pub fn close(&self) -> MapleResult<()> {
        self.pager.close()?;
        Ok(())
    }

    fn row_id_for_insert(&mut self, row: &Row) -> MapleResult<Key> {
        if self.pk_indices.is_empty() {
            let key = encode_auto(self.next_auto_id);
            self.next_auto_id += 1;
            return Ok(key);
        }
        self.composite_row_id(row)
    }

    fn composite_row_id(&self, row: &Row) -> MapleResult<Key> {
        let values: Vec<Value> = self
            .pk_indices
            .iter()
            .map(|&i| row.get(i).cloned().unwrap_or(Value::Null))
            .collect();

        for (value, &idx) in values.iter().zip(&self.pk_indices) {
            if value.is_null() {
                return Err(MapleError::NotNullViolation {
                    column: self.schema.columns()[idx].name.clone(),
                });
            }
        }

        Ok(encode_composite(&values)?)
    }
}

impl std::fmt::Debug for TableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableStore")
            .field("table", &self.schema.name())
            .field("path", &self.path)
            .field("root", &self.root_page_id())
            .finish()
    }
}
