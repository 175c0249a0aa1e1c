//! Shared foundation for MapleDB.
//!
//! This crate holds the types, constants, and error definitions used by
//! every other MapleDB component: page identifiers, key/value byte
//! wrappers, page geometry, and the unified error type.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{ErrorCode, ErrorKind, MapleError, MapleResult};
pub use types::{Key, PageId, Value};
