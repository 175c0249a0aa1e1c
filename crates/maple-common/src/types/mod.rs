//! Core type definitions for MapleDB.

mod ids;
mod keys;

pub use ids::PageId;
pub use keys::{Key, Value};
