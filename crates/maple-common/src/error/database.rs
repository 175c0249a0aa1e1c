//! The unified MapleDB error type.

use std::fmt;
use thiserror::Error;

use crate::types::PageId;

/// Coarse error taxonomy.
///
/// Every [`MapleError`] belongs to exactly one kind; callers that do not
/// care about the specific failure can branch on the kind alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The statement could not be recognized.
    Syntax,
    /// Table or column missing, duplicate table, type mismatch,
    /// constraint or arity violation.
    Schema,
    /// I/O failure, corrupt page, page id out of range.
    Storage,
    /// Tree-level failure; invariant violations indicate corruption.
    Tree,
    /// Value coercion failure.
    Value,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Syntax => "syntax",
            ErrorKind::Schema => "schema",
            ErrorKind::Storage => "storage",
            ErrorKind::Tree => "tree",
            ErrorKind::Value => "value",
        };
        write!(f, "{}", name)
    }
}

/// Stable error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // Syntax errors (0x0100)
    /// The SQL text could not be parsed.
    SyntaxError = 0x0100,
    /// The statement parses but uses an unsupported feature.
    Unsupported = 0x0101,

    // Schema errors (0x0200)
    /// Table not found.
    TableNotFound = 0x0200,
    /// Table already exists.
    TableExists = 0x0201,
    /// Column not found.
    ColumnNotFound = 0x0202,
    /// Value type does not match the declared column type.
    TypeMismatch = 0x0203,
    /// A NOT NULL column is missing or Null.
    NotNullViolation = 0x0204,
    /// INSERT column count does not match value count.
    ArityMismatch = 0x0205,
    /// Duplicate column name in a table definition.
    DuplicateColumn = 0x0206,

    // Storage errors (0x0300)
    /// General I/O error.
    Io = 0x0300,
    /// Page id out of range.
    PageOutOfRange = 0x0301,
    /// A pinned page cannot be freed.
    PagePinned = 0x0302,
    /// Data corruption detected.
    Corruption = 0x0303,
    /// The serialized catalog exceeds its page.
    CatalogOverflow = 0x0304,

    // Tree errors (0x0400)
    /// Key not found.
    KeyNotFound = 0x0400,
    /// Key exceeds the storage limit.
    KeyTooLarge = 0x0401,
    /// Value exceeds the storage limit.
    ValueTooLarge = 0x0402,

    // Value errors (0x0500)
    /// A value could not be coerced to the requested type.
    CoercionFailed = 0x0500,

    // Composite (0x0600)
    /// A multi-row INSERT failed partway through.
    PartialInsert = 0x0600,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

/// The unified error type for MapleDB.
///
/// # Example
///
/// ```rust
/// use maple_common::error::{ErrorKind, MapleError};
///
/// let err = MapleError::TableNotFound { table: "users".into() };
/// assert_eq!(err.kind(), ErrorKind::Schema);
/// ```
#[derive(Debug, Error)]
pub enum MapleError {
    // ==========================================================================
    // Syntax
    // ==========================================================================
    /// The SQL text could not be parsed.
    #[error("syntax error: {message}")]
    Syntax {
        /// Parser diagnostic.
        message: String,
    },

    /// The statement is valid SQL but outside the supported subset.
    #[error("unsupported: {feature}")]
    Unsupported {
        /// The unsupported construct.
        feature: String,
    },

    // ==========================================================================
    // Schema
    // ==========================================================================
    /// Table not found.
    #[error("table '{table}' not found")]
    TableNotFound {
        /// The missing table.
        table: String,
    },

    /// Table already exists.
    #[error("table '{table}' already exists")]
    TableExists {
        /// The duplicate table.
        table: String,
    },

    /// Column not found.
    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound {
        /// The missing column.
        column: String,
        /// The table searched.
        table: String,
    },

    /// Value type does not match the declared column type.
    #[error("type mismatch for column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// The column being assigned.
        column: String,
        /// Declared type name.
        expected: String,
        /// Actual value type name.
        actual: String,
    },

    /// NOT NULL violation.
    #[error("NOT NULL violation: column '{column}'")]
    NotNullViolation {
        /// The violated column.
        column: String,
    },

    /// INSERT arity mismatch.
    #[error("column count doesn't match value count: expected {expected}, got {actual}")]
    ArityMismatch {
        /// Number of target columns.
        expected: usize,
        /// Number of supplied values.
        actual: usize,
    },

    /// Duplicate column name in a table definition.
    #[error("duplicate column '{column}' in table '{table}'")]
    DuplicateColumn {
        /// The repeated column name.
        column: String,
        /// The table being defined.
        table: String,
    },

    // ==========================================================================
    // Storage
    // ==========================================================================
    /// I/O error from the underlying system.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Page id out of range.
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

    /// Data corruption detected.
    #[error("corruption detected: {message}")]
    Corruption {
        /// Description of the corruption.
        message: String,
    },

    /// The serialized catalog exceeds its single page.
    #[error("catalog exceeds its page ({size} bytes)")]
    CatalogOverflow {
        /// Serialized catalog size.
        size: usize,
    },

    // ==========================================================================
    // Tree
    // ==========================================================================
    /// Key not found.
    #[error("key not found")]
    KeyNotFound,

    /// Key exceeds the storage limit.
    #[error("key size {size} exceeds maximum {max_size}")]
    KeyTooLarge {
        /// Actual key size.
        size: usize,
        /// Maximum allowed size.
        max_size: usize,
    },

    /// Value exceeds the storage limit.
    #[error("value size {size} exceeds maximum {max_size}")]
    ValueTooLarge {
        /// Actual value size.
        size: usize,
        /// Maximum allowed size.
        max_size: usize,
    },

    // ==========================================================================
    // Value
    // ==========================================================================
    /// A value could not be coerced to the requested type.
    #[error("cannot convert {value} to {target}")]
    CoercionFailed {
        /// Display form of the offending value.
        value: String,
        /// The requested target type.
        target: &'static str,
    },

    // ==========================================================================
    // Composite
    // ==========================================================================
    /// A multi-row INSERT failed after some rows were applied.
    ///
    /// Rows in a multi-row INSERT are independent: the applied rows stay.
    #[error("insert failed after {applied} row(s): {source}")]
    PartialInsert {
        /// Rows applied before the failure.
        applied: u64,
        /// The failure on the offending row.
        #[source]
        source: Box<MapleError>,
    },
}

impl MapleError {
    /// Returns the coarse error kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax { .. } | Self::Unsupported { .. } => ErrorKind::Syntax,
            Self::TableNotFound { .. }
            | Self::TableExists { .. }
            | Self::ColumnNotFound { .. }
            | Self::TypeMismatch { .. }
            | Self::NotNullViolation { .. }
            | Self::ArityMismatch { .. }
            | Self::DuplicateColumn { .. } => ErrorKind::Schema,
            Self::Io { .. }
            | Self::PageOutOfRange { .. }
            | Self::PagePinned { .. }
            | Self::Corruption { .. }
            | Self::CatalogOverflow { .. } => ErrorKind::Storage,
            Self::KeyNotFound | Self::KeyTooLarge { .. } | Self::ValueTooLarge { .. } => {
                ErrorKind::Tree
            }
            Self::CoercionFailed { .. } => ErrorKind::Value,
            Self::PartialInsert { source, .. } => source.kind(),
        }
    }

    /// Returns the stable error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Syntax { .. } => ErrorCode::SyntaxError,
            Self::Unsupported { .. } => ErrorCode::Unsupported,
            Self::TableNotFound { .. } => ErrorCode::TableNotFound,
            Self::TableExists { .. } => ErrorCode::TableExists,
            Self::ColumnNotFound { .. } => ErrorCode::ColumnNotFound,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::NotNullViolation { .. } => ErrorCode::NotNullViolation,
            Self::ArityMismatch { .. } => ErrorCode::ArityMismatch,
            Self::DuplicateColumn { .. } => ErrorCode::DuplicateColumn,
            Self::Io { .. } => ErrorCode::Io,
            Self::PageOutOfRange { .. } => ErrorCode::PageOutOfRange,
            Self::PagePinned { .. } => ErrorCode::PagePinned,
            Self::Corruption { .. } => ErrorCode::Corruption,
            Self::CatalogOverflow { .. } => ErrorCode::CatalogOverflow,
            Self::KeyNotFound => ErrorCode::KeyNotFound,
            Self::KeyTooLarge { .. } => ErrorCode::KeyTooLarge,
            Self::ValueTooLarge { .. } => ErrorCode::ValueTooLarge,
            Self::CoercionFailed { .. } => ErrorCode::CoercionFailed,
            Self::PartialInsert { .. } => ErrorCode::PartialInsert,
        }
    }

    /// Creates a corruption error.
    #[must_use]
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }

    /// Creates an unsupported-feature error.
    #[must_use]
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        let err = MapleError::TableNotFound {
            table: "users".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(err.code(), ErrorCode::TableNotFound);
    }

    #[test]
    fn test_error_display() {
        let err = MapleError::NotNullViolation {
            column: "name".into(),
        };
        assert_eq!(err.to_string(), "NOT NULL violation: column 'name'");
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MapleError = io_err.into();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_partial_insert_kind_follows_source() {
        let err = MapleError::PartialInsert {
            applied: 3,
            source: Box::new(MapleError::NotNullViolation {
                column: "name".into(),
            }),
        };
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(err.code(), ErrorCode::PartialInsert);
        assert!(err.to_string().contains("after 3 row(s)"));
    }

    #[test]
    fn test_page_out_of_range_display() {
        let err = MapleError::PageOutOfRange {
            page_id: PageId::new(9),
            num_pages: 4,
        };
        assert_eq!(err.to_string(), "page 9 out of range (4 pages)");
    }
}
