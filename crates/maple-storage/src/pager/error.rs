//! Pager error types.

use maple_common::types::PageId;
use thiserror::Error;

/// Errors raised by the page manager.
#[derive(Debug, Error)]
pub enum PagerError {
    /// I/O error from the underlying file.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The requested page id is beyond the end of the file.
    #[error("page {page_id} out of range ({num_pages} pages)")]
    PageOutOfRange {
        /// The requested page.
        page_id: PageId,
        /// Pages in the file.
        num_pages: u32,
    },

    /// A pinned page cannot be freed.
    #[error("cannot free pinned page {page_id}")]
    PagePinned {
        /// The pinned page.
        page_id: PageId,
    },
}

impl From<PagerError> for maple_common::error::MapleError {
    fn from(err: PagerError) -> Self {
        use maple_common::error::MapleError;
        match err {
            PagerError::Io { source } => MapleError::Io { source },
            PagerError::PageOutOfRange {
                page_id,
                num_pages,
            } => MapleError::PageOutOfRange {
                page_id,
                num_pages,
            },
            PagerError::PagePinned { page_id } => MapleError::PagePinned { page_id },
        }
    }
}

/// Result type for pager operations.
pub type PagerResult<T> = Result<T, PagerError>;
