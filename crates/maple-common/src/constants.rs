//! System-wide constants for MapleDB.
//!
//! Page geometry, node layout, and size limits shared by the storage
//! engine and the SQL layer.

// =============================================================================
// Page Geometry
// =============================================================================

/// Size of a single page in bytes (4 KiB).
///
/// The unit of I/O and caching; file offsets are always `page_id * PAGE_SIZE`.
pub const PAGE_SIZE: usize = 4 * 1024;

/// Offset of the page count in the file header page (page 0).
pub const HEADER_NUM_PAGES_OFFSET: usize = 0;

/// Offset of the free-page count in the file header page.
pub const HEADER_NUM_FREE_OFFSET: usize = 4;

/// Offset where the packed free-page id list begins in the header page.
pub const HEADER_FREE_LIST_OFFSET: usize = 8;

/// Maximum number of free-page ids the header page can track.
///
/// Ids freed beyond this cap are dropped and the pages leak; the file
/// simply never reuses them.
pub const HEADER_FREE_LIST_CAPACITY: usize = (PAGE_SIZE - HEADER_FREE_LIST_OFFSET) / 4;

// =============================================================================
// B+-Tree Node Layout
// =============================================================================

/// Size of the tree node header: node_type (1) + num_keys (4) + next_page (4).
pub const NODE_HEADER_SIZE: usize = 9;

/// Maximum number of keys a tree node may hold before it splits.
pub const MAX_KEYS_PER_NODE: usize = 128;

/// Maximum key size in bytes.
///
/// Together with [`MAX_VALUE_SIZE`], chosen so any single leaf entry fits
/// in half a page body; a single split then always restores the page
/// invariant.
pub const MAX_KEY_SIZE: usize = 512;

/// Maximum value size in bytes.
pub const MAX_VALUE_SIZE: usize = 1500;

// =============================================================================
// Catalog
// =============================================================================

/// Page id holding the serialized catalog in the catalog file.
pub const CATALOG_PAGE_ID: u32 = 1;

/// File name of the catalog within the data directory.
///
/// Historically named `.json`; the file is a paged binary file whose
/// page 1 embeds JSON-encoded schemas.
pub const CATALOG_FILE_NAME: &str = "catalog.json";

/// Extension of per-table data files.
pub const TABLE_FILE_EXTENSION: &str = "db";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_geometry() {
        assert!(PAGE_SIZE.is_power_of_two());
        assert!(NODE_HEADER_SIZE < PAGE_SIZE);
        assert_eq!(HEADER_FREE_LIST_OFFSET, HEADER_NUM_FREE_OFFSET + 4);
    }

    #[test]
    fn test_entry_fits_in_half_page() {
        // A leaf entry is two u32 length prefixes plus key and value bytes.
        let max_entry = 8 + MAX_KEY_SIZE + MAX_VALUE_SIZE;
        assert!(max_entry <= (PAGE_SIZE - NODE_HEADER_SIZE) / 2);
    }

    #[test]
    fn test_free_list_capacity() {
        assert_eq!(HEADER_FREE_LIST_CAPACITY, 1022);
    }
}
