//! Page frames - cached pages with pin counts and dirty tracking.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use maple_common::constants::PAGE_SIZE;
use maple_common::types::PageId;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A page held in the cache.
///
/// The page bytes live behind a `RwLock`; the dirty flag and pin count
/// use atomics so metadata updates do not contend with data access.
pub struct PageFrame {
    /// The page id this frame holds.
    id: PageId,
    /// Page bytes, exactly `PAGE_SIZE` long.
    data: RwLock<Box<[u8]>>,
    /// Whether the page was modified since the last flush.
    dirty: AtomicBool,
    /// Number of live references to this frame.
    pin_count: AtomicU32,
}

impl PageFrame {
    /// Creates a zero-filled frame for the given page.
    pub fn new(id: PageId) -> Self {
        Self {
            id,
            data: RwLock::new(vec![0u8; PAGE_SIZE].into_boxed_slice()),
            dirty: AtomicBool::new(false),
            pin_count: AtomicU32::new(0),
        }
    }

    /// Returns the page id.
    #[inline]
    pub fn id(&self) -> PageId {
        self.id
    }

    /// Returns the current pin count.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    /// Increments the pin count.
    #[inline]
    pub fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the pin count.
    #[inline]
    pub fn unpin(&self) -> u32 {
        let old = self.pin_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(old > 0, "unpinned frame with pin_count = 0");
        old - 1
    }

    /// Returns true if the frame is pinned.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    /// Returns true if the page was modified since the last flush.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Sets or clears the dirty flag.
    #[inline]
    pub fn set_dirty(&self, dirty: bool) {
        self.dirty.store(dirty, Ordering::Release);
    }

    /// Returns a read lock on the page bytes.
    #[inline]
    pub fn read_data(&self) -> RwLockReadGuard<'_, Box<[u8]>> {
        self.data.read()
    }

    /// Returns a write lock on the page bytes without touching the dirty
    /// flag. The pager uses this to load bytes from disk.
    #[inline]
    pub(crate) fn write_data_clean(&self) -> RwLockWriteGuard<'_, Box<[u8]>> {
        self.data.write()
    }
}

impl std::fmt::Debug for PageFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFrame")
            .field("id", &self.id)
            .field("pin_count", &self.pin_count())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

/// A scoped pin on a cached page.
///
/// Holding a guard keeps the page in the cache and unfreeable; dropping
/// it releases the pin. `read` gives shared access to the page bytes,
/// `write` gives exclusive access and marks the page dirty.
pub struct PageGuard {
    frame: Arc<PageFrame>,
}

impl PageGuard {
    /// Pins the frame and wraps it in a guard.
    pub(crate) fn pin(frame: Arc<PageFrame>) -> Self {
        frame.pin();
        Self { frame }
    }

    /// Returns the page id.
    #[inline]
    pub fn id(&self) -> PageId {
        self.frame.id()
    }

    /// Returns shared access to the page bytes.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Box<[u8]>> {
        self.frame.read_data()
    }

    /// Returns exclusive access to the page bytes and marks the page dirty.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Box<[u8]>> {
        self.frame.set_dirty(true);
        self.frame.write_data_clean()
    }

    /// Returns true if the page is dirty.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.frame.is_dirty()
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        self.frame.unpin();
    }
}

impl std::fmt::Debug for PageGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageGuard").field("id", &self.id()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let frame = PageFrame::new(PageId::new(3));
        assert_eq!(frame.id(), PageId::new(3));
        assert_eq!(frame.pin_count(), 0);
        assert!(!frame.is_dirty());
        assert_eq!(frame.read_data().len(), PAGE_SIZE);
    }

    #[test]
    fn test_pin_unpin() {
        let frame = PageFrame::new(PageId::new(0));
        assert_eq!(frame.pin(), 1);
        assert_eq!(frame.pin(), 2);
        assert_eq!(frame.unpin(), 1);
        assert_eq!(frame.unpin(), 0);
        assert!(!frame.is_pinned());
    }

    #[test]
    fn test_guard_unpins_on_drop() {
        let frame = Arc::new(PageFrame::new(PageId::new(7)));
        {
            let guard = PageGuard::pin(frame.clone());
            assert_eq!(frame.pin_count(), 1);
            let _second = PageGuard::pin(frame.clone());
            assert_eq!(frame.pin_count(), 2);
            drop(guard);
            assert_eq!(frame.pin_count(), 1);
        }
        assert_eq!(frame.pin_count(), 0);
    }

    #[test]
    fn test_write_marks_dirty() {
        let frame = Arc::new(PageFrame::new(PageId::new(1)));
        let guard = PageGuard::pin(frame.clone());
        assert!(!guard.is_dirty());
        {
            let mut data = guard.write();
            data[0] = 42;
        }
        assert!(guard.is_dirty());
        assert_eq!(guard.read()[0], 42);
    }
}
