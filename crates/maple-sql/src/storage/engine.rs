//! The storage engine.
//!
//! [`StorageEngine`] owns a data directory: one paged catalog file
//! (`catalog.json` - a historical name; the file is paged binary whose
//! page 1 embeds JSON schemas) plus one paged file per table. The
//! catalog is rewritten and flushed on every DDL statement and on
//! close; close also captures each tree's current root page id, which
//! moves whenever a root splits.
//!
//! Locking follows a reader/writer discipline: the catalog and the
//! table map take the writer for DDL and the reader for DML; each
//! table store takes the writer for mutations and the reader for
//! scans.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use maple_common::constants::{CATALOG_FILE_NAME, CATALOG_PAGE_ID, TABLE_FILE_EXTENSION};
use maple_common::error::{MapleError, MapleResult};
use maple_common::types::PageId;
use maple_storage::PageManager;
use parking_lot::RwLock;
use tracing::debug;

use crate::executor::{Row, Value};

use super::catalog::{decode_catalog, encode_catalog, Catalog, TableSchema};
use super::table::{Predicate, TableStore};

/// The storage engine: catalog plus per-table stores.
pub struct StorageEngine {
    data_dir: PathBuf,
    catalog: Catalog,
    catalog_pager: PageManager,
    tables: RwLock<HashMap<String, Arc<RwLock<TableStore>>>>,
}

impl StorageEngine {
    /// Opens (or initializes) the engine over a data directory,
    /// restoring every table recorded in the catalog.
    pub fn open(data_dir: impl AsRef<Path>) -> MapleResult<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;

        let catalog_pager = PageManager::open(data_dir.join(CATALOG_FILE_NAME))?;

        let engine = Self {
            data_dir,
            catalog: Catalog::new(),
            catalog_pager,
            tables: RwLock::new(HashMap::new()),
        };
        engine.load_catalog()?;
        Ok(engine)
    }

    /// Returns the schema of the named table.
    pub fn schema(&self, table: &str) -> MapleResult<Arc<TableSchema>> {
        self.catalog
            .get_table(table)
            .ok_or_else(|| MapleError::TableNotFound {
                table: table.to_string(),
            })
    }

    /// Lists all table names.
    pub fn list_tables(&self) -> Vec<String> {
        self.catalog.list_tables()
    }

    // =========================================================================
    // DDL
    // =========================================================================

    /// Creates a table: registers the schema, creates the table file,
    /// and persists the catalog. The catalog entry is rolled back if
    /// storage creation fails.
    pub fn create_table(&self, schema: TableSchema) -> MapleResult<()> {
        let name = schema.name().to_string();
        let schema = Arc::new(schema);

        // Register first so a duplicate name fails before any file is
        // touched.
        self.catalog
            .create_table(schema.clone(), PageId::INVALID)?;

        let store = match TableStore::create(self.table_path(&name), schema) {
            Ok(store) => store,
            Err(err) => {
                let _ = self.catalog.drop_table(&name);
                return Err(err);
            }
        };
        self.catalog.set_root(&name, store.root_page_id());

        self.tables
            .write()
            .insert(name.clone(), Arc::new(RwLock::new(store)));

        debug!(table = %name, "table created");
        self.save_catalog()
    }

    /// Drops a table: releases its store, deletes the table file, and
    /// persists the catalog.
    pub fn drop_table(&self, table: &str) -> MapleResult<()> {
        if !self.catalog.contains(table) {
            return Err(MapleError::TableNotFound {
                table: table.to_string(),
            });
        }

        if let Some(store) = self.tables.write().remove(table) {
            // Nothing to flush; the file is about to be deleted.
            drop(store);
        }

        match fs::remove_file(self.table_path(table)) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        self.catalog.drop_table(table)?;
        debug!(table = %table, "table dropped");
        self.save_catalog()
    }

    // =========================================================================
    // DML
    // =========================================================================

    /// Inserts one row.
    pub fn insert(&self, table: &str, row: Row) -> MapleResult<()> {
        let store = self.store(table)?;
        let mut store = store.write();
        store.insert(row)
    }

    /// Updates matching rows; returns the count changed.
    pub fn update(
        &self,
        table: &str,
        assignments: &[(usize, Value)],
        predicate: Predicate<'_>,
    ) -> MapleResult<u64> {
        let store = self.store(table)?;
        let mut store = store.write();
        store.update(assignments, predicate)
    }

    /// Deletes matching rows; returns the count removed.
    pub fn delete(&self, table: &str, predicate: Predicate<'_>) -> MapleResult<u64> {
        let store = self.store(table)?;
        let mut store = store.write();
        store.delete(predicate)
    }

    /// Returns matching rows, projected.
    pub fn select(
        &self,
        table: &str,
        projection: Option<&[usize]>,
        predicate: Predicate<'_>,
    ) -> MapleResult<Vec<Row>> {
        let store = self.store(table)?;
        let store = store.read();
        store.select(projection, predicate)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Flushes every table, persists the catalog with each tree's
    /// current root, and flushes the catalog file. This is the
    /// durability contract; the engine assumes a clean shutdown.
    pub fn close(&self) -> MapleResult<()> {
        for (name, store) in self.tables.read().iter() {
            let store = store.read();
            store.flush()?;
            self.catalog.set_root(name, store.root_page_id());
        }
        self.save_catalog()?;
        self.catalog_pager.close()?;
        debug!(data_dir = %self.data_dir.display(), "engine closed");
        Ok(())
    }

    fn store(&self, table: &str) -> MapleResult<Arc<RwLock<TableStore>>> {
        self.tables
            .read()
            .get(table)
            .cloned()
            .ok_or_else(|| MapleError::TableNotFound {
                table: table.to_string(),
            })
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.data_dir
            .join(format!("{table}.{TABLE_FILE_EXTENSION}"))
    }

    /// Restores catalog entries from page 1 of the catalog file and
    /// opens every table store.
    fn load_catalog(&self) -> MapleResult<()> {
        if self.catalog_pager.num_pages() <= CATALOG_PAGE_ID {
            return Ok(());
        }

        let entries = {
            let page = self.catalog_pager.get(PageId::new(CATALOG_PAGE_ID))?;
            let data = page.read();
            decode_catalog(&data)?
        };

        let mut tables = self.tables.write();
        for (name, entry) in entries {
            let store = TableStore::open(
                self.table_path(&name),
                entry.schema.clone(),
                entry.root_page_id,
            )?;
            self.catalog
                .create_table(entry.schema, entry.root_page_id)?;
            tables.insert(name, Arc::new(RwLock::new(store)));
        }

        debug!(tables = tables.len(), "catalog loaded");
        Ok(())
    }

    /// Rewrites page 1 of the catalog file from the in-memory catalog,
    /// capturing each live tree's current root, and flushes.
    fn save_catalog(&self) -> MapleResult<()> {
        for (name, store) in self.tables.read().iter() {
            self.catalog.set_root(name, store.read().root_page_id());
        }

        let encoded = encode_catalog(&self.catalog.entries())?;

        let page = if self.catalog_pager.num_pages() > CATALOG_PAGE_ID {
            self.catalog_pager.get(PageId::new(CATALOG_PAGE_ID))?
        } else {
            let page = self.catalog_pager.allocate()?;
            debug_assert_eq!(page.id(), PageId::new(CATALOG_PAGE_ID));
            page
        };

        {
            let mut data = page.write();
            data.fill(0);
            data[..encoded.len()].copy_from_slice(&encoded);
        }
        drop(page);

        self.catalog_pager.flush_all()?;
        Ok(())
    }
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("data_dir", &self.data_dir)
            .field("tables", &self.catalog.len())
            .finish()
    }
}
