//! B+-tree error types.

use thiserror::Error;

use crate::pager::PagerError;

/// Errors raised by the B+-tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Error from the underlying page manager.
    #[error(transparent)]
    Pager(#[from] PagerError),

    /// The key does not exist in the tree.
    #[error("key not found")]
    KeyNotFound,

    /// The key exceeds the storage limit.
    #[error("key size {size} exceeds maximum {max_size}")]
    KeyTooLarge {
        /// Actual key size.
        size: usize,
        /// Maximum allowed size.
        max_size: usize,
    },

    /// The value exceeds the storage limit.
    #[error("value size {size} exceeds maximum {max_size}")]
    ValueTooLarge {
        /// Actual value size.
        size: usize,
        /// Maximum allowed size.
        max_size: usize,
    },

    /// A node failed to decode; this indicates on-disk corruption and is
    /// not recoverable.
    #[error("corrupt node: {reason}")]
    CorruptNode {
        /// What failed to decode.
        reason: String,
    },
}

impl TreeError {
    /// Creates a corrupt-node error.
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptNode {
            reason: reason.into(),
        }
    }
}

impl From<TreeError> for maple_common::error::MapleError {
    fn from(err: TreeError) -> Self {
        use maple_common::error::MapleError;
        match err {
            TreeError::Pager(pager) => pager.into(),
            TreeError::KeyNotFound => MapleError::KeyNotFound,
            TreeError::KeyTooLarge { size, max_size } => {
                MapleError::KeyTooLarge { size, max_size }
            }
            TreeError::ValueTooLarge { size, max_size } => {
                MapleError::ValueTooLarge { size, max_size }
            }
            TreeError::CorruptNode { reason } => MapleError::corruption(reason),
        }
    }
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
