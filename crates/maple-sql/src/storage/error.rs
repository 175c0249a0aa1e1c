//! Storage-layer codec errors.
//!
//! Table and engine operations surface [`MapleError`] directly; this
//! local error type covers the byte-level codecs (catalog page, row-id,
//! row payload), which convert into [`MapleError`] at the boundary.

use maple_common::error::MapleError;
use thiserror::Error;

/// Errors from the storage codecs.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The serialized catalog exceeds its single page.
    #[error("catalog exceeds its page ({size} bytes)")]
    CatalogOverflow {
        /// Serialized catalog size.
        size: usize,
    },

    /// Malformed bytes where a codec expected structure.
    #[error("decoding failed: {message}")]
    Decode {
        /// What failed to decode.
        message: String,
    },

    /// Schema (de)serialization failure.
    #[error("schema serialization failed: {source}")]
    Schema {
        /// The underlying serde error.
        #[from]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

impl From<StorageError> for MapleError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::CatalogOverflow { size } => MapleError::CatalogOverflow { size },
            StorageError::Decode { message } => MapleError::corruption(message),
            StorageError::Schema { source } => {
                MapleError::corruption(format!("schema serialization failed: {source}"))
            }
        }
    }
}

/// Result type for storage codec operations.
pub type StorageResult<T> = Result<T, StorageError>;
