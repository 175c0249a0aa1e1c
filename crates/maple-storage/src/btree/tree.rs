//! B+-tree operations.
//!
//! The tree stores variable-length `(key, value)` entries in the leaf
//! level, chained left-to-right through `next_page_id` for range scans.
//! Keys compare lexicographically on raw bytes; producing byte strings
//! whose lexicographic order matches semantic order is the row-id
//! codec's job, not the tree's.
//!
//! Deletes do not merge or rebalance - a leaf may become arbitrarily
//! sparse and tree height never decreases. Clean shutdown through the
//! pager's flush is the durability contract.

use std::sync::Arc;

use maple_common::constants::{MAX_KEYS_PER_NODE, MAX_KEY_SIZE, MAX_VALUE_SIZE, PAGE_SIZE};
use maple_common::types::PageId;

use super::error::{TreeError, TreeResult};
use super::node::{InternalNode, LeafEntry, LeafNode, Node};
use crate::pager::PageManager;

/// A disk-backed B+-tree.
pub struct BPlusTree {
    pager: Arc<PageManager>,
    root: PageId,
}

impl BPlusTree {
    /// Creates a new tree: allocates a fresh page and initializes it as
    /// an empty leaf root.
    pub fn create_new(pager: Arc<PageManager>) -> TreeResult<Self> {
        let guard = pager.allocate()?;
        LeafNode::empty().encode(&mut guard.write());
        let root = guard.id();
        drop(guard);

        Ok(Self { pager, root })
    }

    /// Adopts an existing tree rooted at `root`, validating that the
    /// root page decodes as a tree node.
    pub fn open(pager: Arc<PageManager>, root: PageId) -> TreeResult<Self> {
        {
            let guard = pager.get(root)?;
            Node::decode(&guard.read())?;
        }
        Ok(Self { pager, root })
    }

    /// Returns the current root page id.
    ///
    /// The root moves when it splits; whoever persists tree locations
    /// (the catalog) must read this after mutations.
    pub fn root_page_id(&self) -> PageId {
        self.root
    }

    /// Inserts a key/value pair, overwriting the value if the key is
    /// already present.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> TreeResult<()> {
        if key.len() > MAX_KEY_SIZE {
            return Err(TreeError::KeyTooLarge {
                size: key.len(),
                max_size: MAX_KEY_SIZE,
            });
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(TreeError::ValueTooLarge {
                size: value.len(),
                max_size: MAX_VALUE_SIZE,
            });
        }

        // Descend to the leaf, recording the ancestor chain for split
        // propagation.
        let mut stack: Vec<PageId> = Vec::new();
        let mut current = self.root;
        let mut leaf = loop {
            let guard = self.pager.get(current)?;
            let node = Node::decode(&guard.read())?;
            drop(guard);
            match node {
                Node::Internal(internal) => {
                    stack.push(current);
                    current = internal.child_for(key);
                }
                Node::Leaf(leaf) => break leaf,
            }
        };
        let leaf_id = current;

        match leaf.search(key) {
            Ok(idx) => {
                // Overwrite in place when the rewritten node still fits;
                // otherwise fall through so the split machinery applies
                // to the grown entry.
                leaf.entries[idx].value = value.to_vec();
                if leaf.encoded_size() <= PAGE_SIZE {
                    let guard = self.pager.get(leaf_id)?;
                    leaf.encode(&mut guard.write());
                    return Ok(());
                }
            }
            Err(idx) => {
                leaf.entries.insert(
                    idx,
                    LeafEntry {
                        key: key.to_vec(),
                        value: value.to_vec(),
                    },
                );
            }
        }

        if leaf.entries.len() <= MAX_KEYS_PER_NODE && leaf.encoded_size() <= PAGE_SIZE {
            let guard = self.pager.get(leaf_id)?;
            leaf.encode(&mut guard.write());
            return Ok(());
        }

        // Split the leaf: the right half moves to a fresh page, the leaf
        // chain is fixed up (old -> new -> old's previous next), and the
        // new leaf's first key becomes the separator for the parent.
        let right_entries = leaf.split_off_right();
        let separator = right_entries[0].key.clone();

        let right_guard = self.pager.allocate()?;
        let right_id = right_guard.id();
        let right = LeafNode {
            next: leaf.next,
            entries: right_entries,
        };
        leaf.next = right_id;

        right.encode(&mut right_guard.write());
        drop(right_guard);
        let guard = self.pager.get(leaf_id)?;
        leaf.encode(&mut guard.write());
        drop(guard);

        self.propagate_split(stack, leaf_id, separator, right_id)
    }

    /// Walks the ancestor chain inserting the promoted separator,
    /// splitting internal nodes as needed and growing a new root if the
    /// promotion passes the top.
    fn propagate_split(
        &mut self,
        mut stack: Vec<PageId>,
        mut left_id: PageId,
        mut separator: Vec<u8>,
        mut right_id: PageId,
    ) -> TreeResult<()> {
        while let Some(parent_id) = stack.pop() {
            let guard = self.pager.get(parent_id)?;
            let mut parent = InternalNode::decode(&guard.read())?;
            drop(guard);

            parent.insert_separator(separator, right_id);

            if parent.keys.len() <= MAX_KEYS_PER_NODE && parent.encoded_size() <= PAGE_SIZE {
                let guard = self.pager.get(parent_id)?;
                parent.encode(&mut guard.write());
                return Ok(());
            }

            // The parent overflows too: split it around the middle
            // separator, which moves up and is stored in neither half.
            let (middle, right_node) = parent.split_off_right();

            let right_guard = self.pager.allocate()?;
            let new_right_id = right_guard.id();
            right_node.encode(&mut right_guard.write());
            drop(right_guard);

            let guard = self.pager.get(parent_id)?;
            parent.encode(&mut guard.write());
            drop(guard);

            left_id = parent_id;
            separator = middle;
            right_id = new_right_id;
        }

        // The split reached above the root: grow the tree by one level.
        debug_assert_eq!(left_id, self.root);
        let root_guard = self.pager.allocate()?;
        let new_root = InternalNode::new_root(left_id, separator, right_id);
        new_root.encode(&mut root_guard.write());
        self.root = root_guard.id();
        Ok(())
    }

    /// Looks up the value stored under `key`.
    pub fn get(&self, key: &[u8]) -> TreeResult<Option<Vec<u8>>> {
        let leaf = self.find_leaf(key)?.1;
        match leaf.search(key) {
            Ok(idx) => Ok(Some(leaf.entries[idx].value.clone())),
            Err(_) => Ok(None),
        }
    }

    /// Returns every `(key, value)` with `lo <= key <= hi`, in ascending
    /// key order.
    pub fn find_range(&self, lo: &[u8], hi: &[u8]) -> TreeResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut results = Vec::new();
        let (_, mut leaf) = self.find_leaf(lo)?;

        loop {
            for entry in &leaf.entries {
                if entry.key.as_slice() < lo {
                    continue;
                }
                if entry.key.as_slice() > hi {
                    return Ok(results);
                }
                results.push((entry.key.clone(), entry.value.clone()));
            }
            if leaf.next.as_u32() == 0 {
                return Ok(results);
            }
            leaf = self.read_leaf(leaf.next)?;
        }
    }

    /// Returns every `(key, value)` in the tree in ascending key order,
    /// walking the leaf chain from the leftmost leaf.
    pub fn scan_all(&self) -> TreeResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut results = Vec::new();
        let mut leaf = self.leftmost_leaf()?;

        loop {
            for entry in &leaf.entries {
                results.push((entry.key.clone(), entry.value.clone()));
            }
            if leaf.next.as_u32() == 0 {
                return Ok(results);
            }
            leaf = self.read_leaf(leaf.next)?;
        }
    }

    /// Returns the entry with the greatest key, if any.
    pub fn last_entry(&self) -> TreeResult<Option<(Vec<u8>, Vec<u8>)>> {
        // The rightmost leaf normally holds the greatest key, but
        // deletes never rebalance, so it can be empty; fall back to a
        // full chain walk in that case.
        let mut current = self.root;
        let leaf = loop {
            let guard = self.pager.get(current)?;
            let node = Node::decode(&guard.read())?;
            drop(guard);
            match node {
                Node::Internal(internal) => {
                    current = *internal.children.last().expect("internal node has children");
                }
                Node::Leaf(leaf) => break leaf,
            }
        };

        if let Some(entry) = leaf.entries.last() {
            return Ok(Some((entry.key.clone(), entry.value.clone())));
        }

        Ok(self.scan_all()?.into_iter().last())
    }

    /// Removes the entry stored under `key`.
    ///
    /// No merging or rebalancing is performed; the leaf simply shrinks.
    pub fn delete(&mut self, key: &[u8]) -> TreeResult<()> {
        let (leaf_id, mut leaf) = self.find_leaf(key)?;
        match leaf.search(key) {
            Ok(idx) => {
                leaf.entries.remove(idx);
                let guard = self.pager.get(leaf_id)?;
                leaf.encode(&mut guard.write());
                Ok(())
            }
            Err(_) => Err(TreeError::KeyNotFound),
        }
    }

    /// Returns the number of node levels in the tree (1 for a lone
    /// root leaf).
    pub fn height(&self) -> TreeResult<usize> {
        let mut height = 1;
        let mut current = self.root;
        loop {
            let guard = self.pager.get(current)?;
            let node = Node::decode(&guard.read())?;
            drop(guard);
            match node {
                Node::Internal(internal) => {
                    height += 1;
                    current = internal.children[0];
                }
                Node::Leaf(_) => return Ok(height),
            }
        }
    }

    /// Descends to the leaf whose key range covers `key`.
    fn find_leaf(&self, key: &[u8]) -> TreeResult<(PageId, LeafNode)> {
        let mut current = self.root;
        loop {
            let guard = self.pager.get(current)?;
            let node = Node::decode(&guard.read())?;
            drop(guard);
            match node {
                Node::Internal(internal) => current = internal.child_for(key),
                Node::Leaf(leaf) => return Ok((current, leaf)),
            }
        }
    }

    /// Descends to the leftmost leaf.
    fn leftmost_leaf(&self) -> TreeResult<LeafNode> {
        let mut current = self.root;
        loop {
            let guard = self.pager.get(current)?;
            let node = Node::decode(&guard.read())?;
            drop(guard);
            match node {
                Node::Internal(internal) => current = internal.children[0],
                Node::Leaf(leaf) => return Ok(leaf),
            }
        }
    }

    /// Reads and decodes a leaf by page id.
    fn read_leaf(&self, page_id: PageId) -> TreeResult<LeafNode> {
        let guard = self.pager.get(page_id)?;
        let leaf = LeafNode::decode(&guard.read())?;
        Ok(leaf)
    }
}

impl std::fmt::Debug for BPlusTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BPlusTree").field("root", &self.root).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;
    use tempfile::tempdir;

    fn open_tree(dir: &std::path::Path) -> BPlusTree {
        let pager = Arc::new(PageManager::open(dir.join("tree.db")).unwrap());
        BPlusTree::create_new(pager).unwrap()
    }

    fn key_for(i: u32) -> Vec<u8> {
        i.to_be_bytes().to_vec()
    }

    #[test]
    fn test_empty_tree_get() {
        let dir = tempdir().unwrap();
        let tree = open_tree(dir.path());
        assert_eq!(tree.get(b"missing").unwrap(), None);
    }

    #[test]
    fn test_insert_and_get() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());

        tree.insert(b"hello", b"world").unwrap();
        assert_eq!(tree.get(b"hello").unwrap(), Some(b"world".to_vec()));
        assert_eq!(tree.get(b"other").unwrap(), None);
    }

    #[test]
    fn test_overwrite_returns_last_value() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());

        tree.insert(b"k", b"first").unwrap();
        tree.insert(b"k", b"second-and-longer").unwrap();
        assert_eq!(tree.get(b"k").unwrap(), Some(b"second-and-longer".to_vec()));

        tree.insert(b"k", b"3").unwrap();
        assert_eq!(tree.get(b"k").unwrap(), Some(b"3".to_vec()));
    }

    #[test]
    fn test_129th_key_splits_leaf() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());

        for i in 0..MAX_KEYS_PER_NODE as u32 {
            tree.insert(&key_for(i), b"v").unwrap();
        }
        assert_eq!(tree.height().unwrap(), 1);

        tree.insert(&key_for(MAX_KEYS_PER_NODE as u32), b"v").unwrap();
        assert_eq!(tree.height().unwrap(), 2);

        // Every key is still reachable after the split.
        for i in 0..=MAX_KEYS_PER_NODE as u32 {
            assert_eq!(tree.get(&key_for(i)).unwrap(), Some(b"v".to_vec()));
        }
    }

    #[test]
    fn test_root_split_grows_height() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());

        // Enough keys to split the root internal node as well.
        let count = (MAX_KEYS_PER_NODE * MAX_KEYS_PER_NODE) as u32;
        for i in 0..count {
            tree.insert(&key_for(i), b"v").unwrap();
        }
        assert!(tree.height().unwrap() >= 3);

        for i in (0..count).step_by(997) {
            assert_eq!(tree.get(&key_for(i)).unwrap(), Some(b"v".to_vec()));
        }
    }

    #[test]
    fn test_random_order_scan_is_sorted() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());

        let mut keys: Vec<u32> = (0..500).collect();
        keys.shuffle(&mut rand::thread_rng());
        for &i in &keys {
            tree.insert(&key_for(i), &key_for(i)).unwrap();
        }

        let all = tree.scan_all().unwrap();
        assert_eq!(all.len(), 500);
        for (i, (key, _)) in all.iter().enumerate() {
            assert_eq!(key, &key_for(i as u32));
        }
    }

    #[test]
    fn test_find_range_inclusive() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());

        for i in 0..300u32 {
            tree.insert(&key_for(i), b"v").unwrap();
        }

        let results = tree.find_range(&key_for(10), &key_for(20)).unwrap();
        assert_eq!(results.len(), 11);
        assert_eq!(results[0].0, key_for(10));
        assert_eq!(results[10].0, key_for(20));

        let all = tree.find_range(&key_for(0), &key_for(299)).unwrap();
        assert_eq!(all.len(), 300);
    }

    #[test]
    fn test_find_range_empty_range() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());
        tree.insert(&key_for(5), b"v").unwrap();

        let results = tree.find_range(&key_for(10), &key_for(20)).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());

        tree.insert(b"a", b"1").unwrap();
        tree.insert(b"b", b"2").unwrap();
        tree.delete(b"a").unwrap();

        assert_eq!(tree.get(b"a").unwrap(), None);
        assert_eq!(tree.get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn test_delete_missing_key() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());
        assert!(matches!(tree.delete(b"nope"), Err(TreeError::KeyNotFound)));
    }

    #[test]
    fn test_delete_across_splits() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());

        for i in 0..400u32 {
            tree.insert(&key_for(i), b"v").unwrap();
        }
        for i in (0..400u32).filter(|i| i % 2 == 0) {
            tree.delete(&key_for(i)).unwrap();
        }

        let all = tree.scan_all().unwrap();
        assert_eq!(all.len(), 200);
        for (key, _) in &all {
            let i = u32::from_be_bytes(key.as_slice().try_into().unwrap());
            assert_eq!(i % 2, 1);
        }
    }

    #[test]
    fn test_last_entry() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());

        assert_eq!(tree.last_entry().unwrap(), None);

        for i in 0..300u32 {
            tree.insert(&key_for(i), b"v").unwrap();
        }
        let (key, _) = tree.last_entry().unwrap().unwrap();
        assert_eq!(key, key_for(299));
    }

    #[test]
    fn test_key_and_value_limits() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());

        let long_key = vec![0u8; MAX_KEY_SIZE + 1];
        assert!(matches!(
            tree.insert(&long_key, b"v"),
            Err(TreeError::KeyTooLarge { .. })
        ));

        let long_value = vec![0u8; MAX_VALUE_SIZE + 1];
        assert!(matches!(
            tree.insert(b"k", &long_value),
            Err(TreeError::ValueTooLarge { .. })
        ));
    }

    #[test]
    fn test_large_values_split_by_bytes() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());

        // A handful of near-maximum values overflows pages long before
        // the key-count cap does.
        let value = vec![0xCD; MAX_VALUE_SIZE];
        for i in 0..50u32 {
            tree.insert(&key_for(i), &value).unwrap();
        }

        for i in 0..50u32 {
            assert_eq!(tree.get(&key_for(i)).unwrap(), Some(value.clone()));
        }
        let all = tree.scan_all().unwrap();
        assert_eq!(all.len(), 50);
    }

    #[test]
    fn test_reopen_existing_tree() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.db");

        let root = {
            let pager = Arc::new(PageManager::open(&path).unwrap());
            let mut tree = BPlusTree::create_new(pager.clone()).unwrap();
            for i in 0..1000u32 {
                tree.insert(&key_for(i), b"payload").unwrap();
            }
            let root = tree.root_page_id();
            pager.close().unwrap();
            root
        };

        let pager = Arc::new(PageManager::open(&path).unwrap());
        let tree = BPlusTree::open(pager, root).unwrap();
        let all = tree.scan_all().unwrap();
        assert_eq!(all.len(), 1000);
        assert_eq!(tree.get(&key_for(567)).unwrap(), Some(b"payload".to_vec()));
    }

    #[test]
    fn test_insert_then_delete_then_get() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());

        tree.insert(b"k", b"v").unwrap();
        tree.delete(b"k").unwrap();
        assert_eq!(tree.get(b"k").unwrap(), None);
    }
}
