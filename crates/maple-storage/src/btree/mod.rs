//! B+-tree index over paged storage.
//!
//! Variable-length key/value entries in page-sized nodes: an ordered
//! leaf level chained by `next_page_id`, internal nodes of separator
//! keys and child pointers, recursive insert with splits and root
//! growth. See [`node`] for the on-page layout and [`tree`] for the
//! operations.

mod error;
mod node;
mod tree;

pub use error::{TreeError, TreeResult};
pub use node::{InternalNode, LeafEntry, LeafNode, Node, NODE_TYPE_INTERNAL, NODE_TYPE_LEAF};
pub use tree::BPlusTree;
