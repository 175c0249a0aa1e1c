//! The page manager.
//!
//! A [`PageManager`] owns one paged file: it allocates, reads, writes,
//! frees, and caches fixed-size pages. Page 0 is the file header (page
//! count + free-page list) and stays pinned in the cache for the life of
//! the manager.
//!
//! All access to page contents goes through [`PageGuard`]s handed out by
//! [`PageManager::get`] and [`PageManager::allocate`]; the guard pins the
//! page and releases the pin on drop.

mod error;

pub use error::{PagerError, PagerResult};

use std::collections::HashMap;
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use maple_common::constants::PAGE_SIZE;
use maple_common::types::PageId;
use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::page::{FileHeader, PageFrame, PageGuard};

/// Mutable pager state behind one lock: the cache, the free list, and
/// the page count.
struct PagerState {
    num_pages: u32,
    free_pages: Vec<PageId>,
    cache: HashMap<PageId, Arc<PageFrame>>,
}

/// Manages the allocation, reading, writing, and caching of pages in one
/// file.
///
/// Reads and writes are page-aligned and never partial. The dirty bit is
/// authoritative: a page is only written back if it was modified through
/// a guard's `write()`. The cache is unbounded; pinned pages are
/// unfreeable.
pub struct PageManager {
    file: Mutex<File>,
    path: PathBuf,
    state: RwLock<PagerState>,
}

impl PageManager {
    /// Opens the paged file at `path`, creating it (and its parent
    /// directories) if needed.
    ///
    /// An empty file gets a zeroed header page and `num_pages = 1`; an
    /// existing file has its page count and free list restored from
    /// page 0.
    pub fn open<P: AsRef<Path>>(path: P) -> PagerResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let file_size = file.metadata()?.len();
        let mut state = PagerState {
            num_pages: (file_size / PAGE_SIZE as u64) as u32,
            free_pages: Vec::new(),
            cache: HashMap::new(),
        };

        let header_frame = Arc::new(PageFrame::new(PageId::HEADER));
        if state.num_pages == 0 {
            // Fresh file: write an initial header and keep it dirty until
            // the first flush.
            state.num_pages = 1;
            let header = FileHeader::new_file();
            header.encode(&mut header_frame.write_data_clean());
            header_frame.set_dirty(true);
        } else {
            read_page_at(&file, PageId::HEADER, &mut header_frame.write_data_clean())?;
            let header = FileHeader::decode(&header_frame.read_data());
            state.num_pages = header.num_pages;
            state.free_pages = header.free_pages;
        }

        // The header stays pinned (and thus unfreeable and unevictable)
        // for the life of the manager.
        header_frame.pin();
        state.cache.insert(PageId::HEADER, header_frame);

        trace!(path = %path.display(), num_pages = state.num_pages, "pager opened");

        Ok(Self {
            file: Mutex::new(file),
            path,
            state: RwLock::new(state),
        })
    }

    /// Returns the path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current page count, header page included.
    pub fn num_pages(&self) -> u32 {
        self.state.read().num_pages
    }

    /// Allocates a page, reusing a free page if one is available.
    ///
    /// The returned page is zero-filled, pinned, dirty, and cached. The
    /// header page is updated to reflect the new page count / free list.
    pub fn allocate(&self) -> PagerResult<PageGuard> {
        let mut state = self.state.write();

        let page_id = if let Some(id) = state.free_pages.pop() {
            id
        } else {
            let id = PageId::new(state.num_pages);
            state.num_pages += 1;
            // Keep the file size consistent with num_pages even if the
            // page is never flushed.
            self.file
                .lock()
                .set_len(state.num_pages as u64 * PAGE_SIZE as u64)?;
            id
        };

        let frame = Arc::new(PageFrame::new(page_id));
        frame.set_dirty(true);
        state.cache.insert(page_id, frame.clone());

        self.write_header_locked(&mut state);
        trace!(page_id = %page_id, "page allocated");

        Ok(PageGuard::pin(frame))
    }

    /// Fetches a page by id, from the cache or from disk.
    pub fn get(&self, page_id: PageId) -> PagerResult<PageGuard> {
        {
            let state = self.state.read();
            if page_id.as_u32() >= state.num_pages {
                return Err(PagerError::PageOutOfRange {
                    page_id,
                    num_pages: state.num_pages,
                });
            }
            if let Some(frame) = state.cache.get(&page_id) {
                return Ok(PageGuard::pin(frame.clone()));
            }
        }

        // Not cached: read from disk without holding the state lock.
        let frame = Arc::new(PageFrame::new(page_id));
        read_page_at(&self.file.lock(), page_id, &mut frame.write_data_clean())?;

        let mut state = self.state.write();
        // Another caller may have loaded the page while we were reading.
        if let Some(existing) = state.cache.get(&page_id) {
            return Ok(PageGuard::pin(existing.clone()));
        }
        state.cache.insert(page_id, frame.clone());
        Ok(PageGuard::pin(frame))
    }

    /// Returns a page to the free list for reuse.
    ///
    /// Fails with [`PagerError::PagePinned`] if the page is still in use.
    pub fn free(&self, page_id: PageId) -> PagerResult<()> {
        let mut state = self.state.write();

        if let Some(frame) = state.cache.get(&page_id) {
            if frame.is_pinned() {
                return Err(PagerError::PagePinned { page_id });
            }
            state.cache.remove(&page_id);
        }

        state.free_pages.push(page_id);
        self.write_header_locked(&mut state);
        trace!(page_id = %page_id, "page freed");
        Ok(())
    }

    /// Writes a page back to disk if it is dirty.
    ///
    /// A failed write leaves the dirty bit set so a later flush retries.
    pub fn flush(&self, page_id: PageId) -> PagerResult<()> {
        let frame = {
            let state = self.state.read();
            match state.cache.get(&page_id) {
                Some(frame) => frame.clone(),
                None => return Ok(()),
            }
        };
        self.flush_frame(&frame)
    }

    /// Writes every dirty cached page back to disk and syncs the file.
    pub fn flush_all(&self) -> PagerResult<()> {
        // Snapshot the dirty frames first; writing happens without the
        // state lock so concurrent readers are not blocked on I/O.
        let dirty: Vec<Arc<PageFrame>> = {
            let state = self.state.read();
            state
                .cache
                .values()
                .filter(|f| f.is_dirty())
                .cloned()
                .collect()
        };

        let count = dirty.len();
        for frame in dirty {
            self.flush_frame(&frame)?;
        }
        self.file.lock().sync_all()?;
        trace!(path = %self.path.display(), flushed = count, "flush_all");
        Ok(())
    }

    /// Flushes all dirty pages; the file itself closes when the manager
    /// is dropped. This is the durability contract: data is guaranteed
    /// on disk only after a clean close.
    pub fn close(&self) -> PagerResult<()> {
        self.flush_all()
    }

    fn flush_frame(&self, frame: &PageFrame) -> PagerResult<()> {
        if !frame.is_dirty() {
            return Ok(());
        }
        {
            let data = frame.read_data();
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(
                frame.id().as_u32() as u64 * PAGE_SIZE as u64,
            ))?;
            file.write_all(&data)?;
        }
        frame.set_dirty(false);
        Ok(())
    }

    /// Rewrites the header page from the current state and marks it
    /// dirty. Called with the state lock held.
    fn write_header_locked(&self, state: &mut PagerState) {
        let header = FileHeader {
            num_pages: state.num_pages,
            free_pages: state.free_pages.clone(),
        };
        let frame = state
            .cache
            .get(&PageId::HEADER)
            .expect("header frame is always cached");
        header.encode(&mut frame.write_data_clean());
        frame.set_dirty(true);
    }
}

impl std::fmt::Debug for PageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("PageManager")
            .field("path", &self.path)
            .field("num_pages", &state.num_pages)
            .field("free_pages", &state.free_pages.len())
            .field("cached", &state.cache.len())
            .finish()
    }
}

/// Reads one page from the file into `buf`.
fn read_page_at(file: &File, page_id: PageId, buf: &mut [u8]) -> PagerResult<()> {
    let mut file = file;
    file.seek(SeekFrom::Start(page_id.as_u32() as u64 * PAGE_SIZE as u64))?;
    file.read_exact(&mut buf[..PAGE_SIZE])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_new_file() {
        let dir = tempdir().unwrap();
        let pm = PageManager::open(dir.path().join("test.db")).unwrap();
        assert_eq!(pm.num_pages(), 1);
    }

    #[test]
    fn test_allocate_sequential_ids() {
        let dir = tempdir().unwrap();
        let pm = PageManager::open(dir.path().join("test.db")).unwrap();

        let p1 = pm.allocate().unwrap();
        let p2 = pm.allocate().unwrap();
        assert_eq!(p1.id(), PageId::new(1));
        assert_eq!(p2.id(), PageId::new(2));
        assert_eq!(pm.num_pages(), 3);
    }

    #[test]
    fn test_allocate_zero_filled() {
        let dir = tempdir().unwrap();
        let pm = PageManager::open(dir.path().join("test.db")).unwrap();

        let page = pm.allocate().unwrap();
        assert!(page.read().iter().all(|&b| b == 0));
        assert!(page.is_dirty());
    }

    #[test]
    fn test_get_out_of_range() {
        let dir = tempdir().unwrap();
        let pm = PageManager::open(dir.path().join("test.db")).unwrap();

        let result = pm.get(PageId::new(5));
        assert!(matches!(
            result,
            Err(PagerError::PageOutOfRange { .. })
        ));
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempdir().unwrap();
        let pm = PageManager::open(dir.path().join("test.db")).unwrap();

        let page_id = {
            let page = pm.allocate().unwrap();
            page.write()[100] = 7;
            page.id()
        };

        let page = pm.get(page_id).unwrap();
        assert_eq!(page.read()[100], 7);
    }

    #[test]
    fn test_durability_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let page_id = {
            let pm = PageManager::open(&path).unwrap();
            let page = pm.allocate().unwrap();
            page.write()[0] = 0xAB;
            let id = page.id();
            drop(page);
            pm.close().unwrap();
            id
        };

        let pm = PageManager::open(&path).unwrap();
        assert_eq!(pm.num_pages(), 2);
        let page = pm.get(page_id).unwrap();
        assert_eq!(page.read()[0], 0xAB);
    }

    #[test]
    fn test_free_and_reuse() {
        let dir = tempdir().unwrap();
        let pm = PageManager::open(dir.path().join("test.db")).unwrap();

        let page_id = {
            let page = pm.allocate().unwrap();
            page.id()
        };

        pm.free(page_id).unwrap();
        let reused = pm.allocate().unwrap();
        assert_eq!(reused.id(), page_id);
    }

    #[test]
    fn test_free_pinned_page_fails() {
        let dir = tempdir().unwrap();
        let pm = PageManager::open(dir.path().join("test.db")).unwrap();

        let page = pm.allocate().unwrap();
        let result = pm.free(page.id());
        assert!(matches!(result, Err(PagerError::PagePinned { .. })));

        // Released guard makes the page freeable.
        let id = page.id();
        drop(page);
        pm.free(id).unwrap();
    }

    #[test]
    fn test_header_page_never_freeable() {
        let dir = tempdir().unwrap();
        let pm = PageManager::open(dir.path().join("test.db")).unwrap();

        let result = pm.free(PageId::HEADER);
        assert!(matches!(result, Err(PagerError::PagePinned { .. })));
    }

    #[test]
    fn test_free_list_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let freed = {
            let pm = PageManager::open(&path).unwrap();
            let a = pm.allocate().unwrap().id();
            let _b = pm.allocate().unwrap().id();
            pm.free(a).unwrap();
            pm.close().unwrap();
            a
        };

        let pm = PageManager::open(&path).unwrap();
        assert_eq!(pm.num_pages(), 3);
        let reused = pm.allocate().unwrap();
        assert_eq!(reused.id(), freed);
    }

    #[test]
    fn test_flush_clears_dirty() {
        let dir = tempdir().unwrap();
        let pm = PageManager::open(dir.path().join("test.db")).unwrap();

        let page = pm.allocate().unwrap();
        page.write()[0] = 1;
        assert!(page.is_dirty());

        pm.flush(page.id()).unwrap();
        assert!(!page.is_dirty());
    }

    #[test]
    fn test_cache_hit_same_frame() {
        let dir = tempdir().unwrap();
        let pm = PageManager::open(dir.path().join("test.db")).unwrap();

        let id = pm.allocate().unwrap().id();
        let a = pm.get(id).unwrap();
        a.write()[10] = 42;
        let b = pm.get(id).unwrap();
        assert_eq!(b.read()[10], 42);
    }
}
