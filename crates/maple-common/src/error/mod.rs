//! Error handling for MapleDB.
//!
//! This module provides the unified error type and result alias surfaced
//! by the database API. Individual components (pager, tree, parser,
//! storage) define their own local error enums and convert into
//! [`MapleError`] at the engine boundary.

mod database;

pub use database::{ErrorCode, ErrorKind, MapleError};

/// Result type alias for MapleDB operations.
pub type MapleResult<T> = std::result::Result<T, MapleError>;
