//! B+Tree node: fixed-capacity key and pointer slots plus a live count.

use bytes::{Buf, BufMut};

use crate::error::{RecError, Result};
use crate::storage::types::NULL_POINTER;
use crate::storage::{BlockAddr, RecordOffset, TreeGeometry};

use super::IndexKey;

/// One index block, either a leaf or an internal node.
///
/// `keys` has `order - 1` slots and `pointers` has `order` slots. Only the
/// first `key_count` keys are live. In a leaf, `pointers[i]` is the record
/// offset paired with `keys[i]`; in an internal node, `pointers[i]` is the
/// child holding keys `>= keys[i-1]` and `< keys[i]`, with `key_count + 1`
/// live pointers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode<K> {
    is_leaf: bool,
    key_count: usize,
    keys: Box<[K]>,
    pointers: Box<[u64]>,
    next_leaf: Option<BlockAddr>,
}

impl<K: IndexKey> TreeNode<K> {
    pub fn new_leaf(geometry: &TreeGeometry) -> Self {
        Self::empty(geometry, true)
    }

    pub fn new_internal(geometry: &TreeGeometry) -> Self {
        Self::empty(geometry, false)
    }

    fn empty(geometry: &TreeGeometry, is_leaf: bool) -> Self {
        Self {
            is_leaf,
            key_count: 0,
            keys: vec![K::default(); geometry.max_keys()].into_boxed_slice(),
            pointers: vec![NULL_POINTER; geometry.order()].into_boxed_slice(),
            next_leaf: None,
        }
    }

    /// Internal node with a single separator over two children.
    pub(crate) fn new_root(
        geometry: &TreeGeometry,
        left: BlockAddr,
        separator: K,
        right: BlockAddr,
    ) -> Self {
        let mut root = Self::new_internal(geometry);
        root.keys[0] = separator;
        root.pointers[0] = left.get();
        root.pointers[1] = right.get();
        root.key_count = 1;
        root
    }

    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    pub fn key_count(&self) -> usize {
        self.key_count
    }

    /// Live keys in ascending order
    pub fn keys(&self) -> &[K] {
        &self.keys[..self.key_count]
    }

    pub fn is_full(&self) -> bool {
        self.key_count == self.keys.len()
    }

    pub fn next_leaf(&self) -> Option<BlockAddr> {
        self.next_leaf
    }

    pub(crate) fn set_next_leaf(&mut self, next: Option<BlockAddr>) {
        self.next_leaf = next;
    }

    /// Index of the child to descend into: the first `i` with `key < keys[i]`.
    pub fn child_index(&self, key: K) -> usize {
        self.keys().partition_point(|k| *k <= key)
    }

    /// Child pointer `i` of an internal node.
    pub fn child(&self, index: usize) -> Result<BlockAddr> {
        if self.is_leaf || index > self.key_count {
            return Err(RecError::Corruption(format!(
                "child {} requested from {} node with {} keys",
                index,
                if self.is_leaf { "leaf" } else { "internal" },
                self.key_count
            )));
        }
        BlockAddr::from_raw(self.pointers[index]).ok_or_else(|| {
            RecError::Corruption(format!("internal node has null child at {}", index))
        })
    }

    /// Exact-match scan of a leaf.
    pub fn find(&self, key: K) -> Option<RecordOffset> {
        self.keys()
            .iter()
            .position(|k| *k == key)
            .map(|i| RecordOffset::new(self.pointers[i]))
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Replace the offset of an existing leaf key. Returns false if absent.
    pub(crate) fn replace(&mut self, key: K, offset: RecordOffset) -> bool {
        match self.keys().iter().position(|k| *k == key) {
            Some(i) => {
                self.pointers[i] = offset.get();
                true
            }
            None => false,
        }
    }

    /// Insert into a leaf with room, shifting larger keys right.
    pub(crate) fn insert_into_leaf(&mut self, key: K, offset: RecordOffset) {
        debug_assert!(self.is_leaf && !self.is_full());
        let pos = self.keys().partition_point(|k| *k < key);
        let count = self.key_count;

        self.keys.copy_within(pos..count, pos + 1);
        self.pointers.copy_within(pos..count, pos + 1);
        self.keys[pos] = key;
        self.pointers[pos] = offset.get();
        self.key_count += 1;
    }

    /// Insert a separator into an internal node with room. The new child
    /// lands immediately right of its separator.
    pub(crate) fn insert_into_internal(&mut self, separator: K, child: BlockAddr) {
        debug_assert!(!self.is_leaf && !self.is_full());
        let pos = self.keys().partition_point(|k| *k < separator);
        let count = self.key_count;

        self.keys.copy_within(pos..count, pos + 1);
        self.pointers.copy_within(pos + 1..count + 1, pos + 2);
        self.keys[pos] = separator;
        self.pointers[pos + 1] = child.get();
        self.key_count += 1;
    }

    /// Split a full leaf around the new pair.
    ///
    /// The lower half stays here and the upper half moves into `right`.
    /// Returns the first key of `right`, which also stays in the leaf. The
    /// caller relinks `next_leaf`.
    pub(crate) fn split_leaf(&mut self, key: K, offset: RecordOffset, right: &mut Self) -> K {
        debug_assert!(self.is_leaf && right.is_leaf);
        let mut pairs: Vec<(K, u64)> = self
            .keys()
            .iter()
            .copied()
            .zip(self.pointers.iter().copied())
            .collect();
        let pos = pairs.partition_point(|(k, _)| *k < key);
        pairs.insert(pos, (key, offset.get()));

        let split = pairs.len() / 2;
        self.fill_leaf(&pairs[..split]);
        right.fill_leaf(&pairs[split..]);
        right.keys[0]
    }

    /// Split a full internal node around the incoming separator.
    ///
    /// The median (`order / 2`) is returned for promotion and kept in neither
    /// half; keys after it and their children move into `right`.
    pub(crate) fn split_internal(&mut self, separator: K, child: BlockAddr, right: &mut Self) -> K {
        debug_assert!(!self.is_leaf && !right.is_leaf);
        let mut keys: Vec<K> = self.keys().to_vec();
        let mut children: Vec<u64> = self.pointers[..=self.key_count].to_vec();
        let pos = keys.partition_point(|k| *k < separator);
        keys.insert(pos, separator);
        children.insert(pos + 1, child.get());

        let mid = self.pointers.len() / 2;
        let promoted = keys[mid];
        self.fill_internal(&keys[..mid], &children[..=mid]);
        right.fill_internal(&keys[mid + 1..], &children[mid + 1..]);
        promoted
    }

    fn fill_leaf(&mut self, pairs: &[(K, u64)]) {
        self.keys.fill(K::default());
        self.pointers.fill(NULL_POINTER);
        for (i, (k, p)) in pairs.iter().enumerate() {
            self.keys[i] = *k;
            self.pointers[i] = *p;
        }
        self.key_count = pairs.len();
    }

    fn fill_internal(&mut self, keys: &[K], children: &[u64]) {
        debug_assert_eq!(keys.len() + 1, children.len());
        self.keys.fill(K::default());
        self.pointers.fill(NULL_POINTER);
        self.keys[..keys.len()].copy_from_slice(keys);
        self.pointers[..children.len()].copy_from_slice(children);
        self.key_count = keys.len();
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Encode into exactly `geometry.node_size()` bytes.
    pub(crate) fn encode(&self, geometry: &TreeGeometry) -> Vec<u8> {
        let mut buf = Vec::with_capacity(geometry.node_size());
        buf.put_u8(self.is_leaf as u8);
        buf.put_u32_le(self.key_count as u32);
        for key in self.keys.iter() {
            key.write_to(&mut buf);
        }
        for pointer in self.pointers.iter() {
            buf.put_u64_le(*pointer);
        }
        buf.put_u64_le(BlockAddr::to_raw(self.next_leaf));
        debug_assert_eq!(buf.len(), geometry.node_size());
        buf
    }

    /// Decode a node block, checking its count against the node capacity.
    pub(crate) fn decode(buf: &[u8], geometry: &TreeGeometry) -> Result<Self> {
        if buf.len() < geometry.node_size() {
            return Err(RecError::Corruption(format!(
                "node block is {} bytes, expected {}",
                buf.len(),
                geometry.node_size()
            )));
        }

        let mut input = &buf[..geometry.node_size()];
        let is_leaf = match input.get_u8() {
            0 => false,
            1 => true,
            other => {
                return Err(RecError::Corruption(format!("invalid is_leaf byte {}", other)))
            }
        };
        let key_count = input.get_u32_le() as usize;
        if key_count > geometry.max_keys() {
            return Err(RecError::Corruption(format!(
                "node has {} keys, max {}",
                key_count,
                geometry.max_keys()
            )));
        }

        let keys: Box<[K]> = (0..geometry.max_keys())
            .map(|_| K::read_from(&mut input))
            .collect();
        let pointers: Box<[u64]> = (0..geometry.order()).map(|_| input.get_u64_le()).collect();
        let next_leaf = BlockAddr::from_raw(input.get_u64_le());

        Ok(Self {
            is_leaf,
            key_count,
            keys,
            pointers,
            next_leaf,
        })
    }
}
