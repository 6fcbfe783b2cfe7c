//! On-disk B+Tree over fixed-width keys.

use std::path::Path;

use tracing::{debug, error, warn};

use crate::error::{RecError, Result};
use crate::storage::block_file::BlockFile;
use crate::storage::cache::{BlockCache, CacheStats};
use crate::storage::{BlockAddr, Lookup, RecordOffset, TreeGeometry};

use super::meta::{IndexMetadata, DATA_START_OFFSET, HEADER_SIZE};
use super::{IndexKey, TreeNode};

/// Ordered map from `K` to record offsets, stored as fixed-size nodes
///
/// ## Lifecycle
/// `open()` creates or validates the file, `close()` flushes dirty nodes and
/// the header. Dropping an unclosed tree performs the same flush and logs any
/// failure.
///
/// ## Duplicate keys
/// Inserting a key that is already present replaces its offset.
pub struct IndexTree<K: IndexKey> {
    /// Exclusive handle on the index file
    file: BlockFile,

    /// Node layout for this key width
    geometry: TreeGeometry,

    /// Current root node
    root: BlockAddr,

    /// Node blocks allocated after the header
    block_count: u64,

    /// Node offset → in-memory node
    cache: BlockCache<BlockAddr, TreeNode<K>>,

    /// Set once `close()` has flushed successfully
    closed: bool,
}

impl<K: IndexKey> IndexTree<K> {
    /// Open an index file, creating it with an empty root leaf if needed
    ///
    /// An existing header is validated strictly; a file too short to hold a
    /// header or a header inconsistent with the file is rejected.
    pub fn open(path: &Path, geometry: TreeGeometry, cache_capacity: usize) -> Result<Self> {
        if geometry.key_width() != K::WIDTH {
            return Err(RecError::Config(format!(
                "tree geometry is for {}-byte keys, index uses {}-byte keys",
                geometry.key_width(),
                K::WIDTH
            )));
        }

        let mut file = BlockFile::open(path)?;
        let len = file.len()?;

        let meta = if len == 0 {
            let meta = IndexMetadata::initial();
            file.write_at(0, &meta.to_bytes()?)?;
            file.write_at(meta.root_offset, &TreeNode::<K>::new_leaf(&geometry).encode(&geometry))?;
            file.sync()?;
            debug!(
                path = %path.display(),
                order = geometry.order(),
                node_size = geometry.node_size(),
                "created index file"
            );
            meta
        } else if len < HEADER_SIZE {
            return Err(RecError::Metadata(format!(
                "index file {} is {} bytes, too small for a {}-byte header",
                path.display(),
                len,
                HEADER_SIZE
            )));
        } else {
            let mut header = [0u8; HEADER_SIZE as usize];
            file.read_at(0, &mut header)?;
            let meta = IndexMetadata::from_bytes(&header)?;
            meta.validate(&geometry, len)?;
            debug!(
                path = %path.display(),
                root = meta.root_offset,
                blocks = meta.block_count,
                "opened index file"
            );
            meta
        };

        Ok(Self {
            file,
            geometry,
            root: meta.root(),
            block_count: meta.block_count,
            cache: BlockCache::new(cache_capacity),
            closed: false,
        })
    }

    /// Find the record offset stored for `key`, counting nodes visited
    pub fn search(&mut self, key: K) -> Result<Lookup<RecordOffset>> {
        let mut addr = self.root;
        let mut blocks_read = 0;

        loop {
            let node = self.read_node(addr)?;
            blocks_read += 1;

            if node.is_leaf() {
                return Ok(match node.find(key) {
                    Some(offset) => Lookup::found(offset, blocks_read),
                    None => Lookup::not_found(blocks_read),
                });
            }

            if blocks_read >= self.block_count {
                return Err(RecError::Corruption(format!(
                    "descent from {} visited {} internal nodes without reaching a leaf",
                    self.root, blocks_read
                )));
            }
            addr = node.child(node.child_index(key))?;
        }
    }

    /// Insert `key → offset`, splitting nodes on the way back up
    pub fn insert(&mut self, key: K, offset: RecordOffset) -> Result<()> {
        let root = self.root;
        if let Some((separator, right)) = self.insert_into(root, key, offset, 0)? {
            let new_root = TreeNode::new_root(&self.geometry, root, separator, right);
            let addr = self.allocate_block()?;
            self.write_node(addr, new_root)?;
            self.root = addr;
            debug!(root = %addr, separator = %separator, "root split, tree grew one level");
        }
        Ok(())
    }

    /// Write dirty nodes and the header, then sync
    pub fn flush(&mut self) -> Result<()> {
        self.flush_cache()?;
        let meta = IndexMetadata {
            root_offset: self.root.get(),
            block_count: self.block_count,
        };
        self.file.write_at(0, &meta.to_bytes()?)?;
        self.file.sync()
    }

    /// Flush and release the file
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        self.closed = true;
        debug!(
            path = %self.file.path().display(),
            root = %self.root,
            blocks = self.block_count,
            "closed index file"
        );
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Node blocks allocated in the file
    pub fn block_count(&self) -> u64 {
        self.block_count
    }

    pub fn root(&self) -> BlockAddr {
        self.root
    }

    pub fn geometry(&self) -> &TreeGeometry {
        &self.geometry
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Number of levels from the root down to the leaves
    pub fn height(&mut self) -> Result<u64> {
        let mut node = self.read_node(self.root)?;
        let mut height = 1;
        while !node.is_leaf() {
            if height >= self.block_count {
                return Err(RecError::Corruption("leftmost path does not end in a leaf".to_string()));
            }
            node = self.read_node(node.child(0)?)?;
            height += 1;
        }
        Ok(height)
    }

    /// Keys of every leaf, following `next_leaf` from the leftmost leaf
    ///
    /// For verification and diagnostics; reads every leaf.
    pub fn leaf_chain(&mut self) -> Result<Vec<Vec<K>>> {
        let mut node = self.read_node(self.root)?;
        while !node.is_leaf() {
            node = self.read_node(node.child(0)?)?;
        }

        let mut leaves = vec![node.keys().to_vec()];
        let mut next = node.next_leaf();
        while let Some(addr) = next {
            if leaves.len() as u64 >= self.block_count {
                return Err(RecError::Corruption("leaf chain contains a cycle".to_string()));
            }
            let leaf = self.read_node(addr)?;
            if !leaf.is_leaf() {
                return Err(RecError::Corruption(format!("leaf chain points at internal {}", addr)));
            }
            leaves.push(leaf.keys().to_vec());
            next = leaf.next_leaf();
        }
        Ok(leaves)
    }

    // =========================================================================
    // Insert Helpers
    // =========================================================================

    /// Insert below `addr`. Returns the separator and new right sibling when
    /// the node at `addr` split.
    fn insert_into(
        &mut self,
        addr: BlockAddr,
        key: K,
        offset: RecordOffset,
        depth: u64,
    ) -> Result<Option<(K, BlockAddr)>> {
        if depth >= self.block_count {
            return Err(RecError::Corruption(format!(
                "insert descended {} levels from {} without reaching a leaf",
                depth, self.root
            )));
        }

        let mut node = self.read_node(addr)?;

        if node.is_leaf() {
            if node.replace(key, offset) {
                self.write_node(addr, node)?;
                return Ok(None);
            }
            if !node.is_full() {
                node.insert_into_leaf(key, offset);
                self.write_node(addr, node)?;
                return Ok(None);
            }

            let right_addr = self.allocate_block()?;
            let mut right = TreeNode::new_leaf(&self.geometry);
            let separator = node.split_leaf(key, offset, &mut right);
            right.set_next_leaf(node.next_leaf());
            node.set_next_leaf(Some(right_addr));

            self.write_node(right_addr, right)?;
            self.write_node(addr, node)?;
            return Ok(Some((separator, right_addr)));
        }

        let child = node.child(node.child_index(key))?;
        let Some((separator, right_child)) = self.insert_into(child, key, offset, depth + 1)? else {
            return Ok(None);
        };

        if !node.is_full() {
            node.insert_into_internal(separator, right_child);
            self.write_node(addr, node)?;
            return Ok(None);
        }

        let right_addr = self.allocate_block()?;
        let mut right = TreeNode::new_internal(&self.geometry);
        let promoted = node.split_internal(separator, right_child, &mut right);

        self.write_node(right_addr, right)?;
        self.write_node(addr, node)?;
        Ok(Some((promoted, right_addr)))
    }

    /// Reserve the next node block and extend the file with an empty node
    ///
    /// `block_count` decides the position. If the file already extends past
    /// it, the block is placed at the next boundary after the physical end.
    fn allocate_block(&mut self) -> Result<BlockAddr> {
        let node_size = self.geometry.node_size() as u64;
        let mut offset = DATA_START_OFFSET + self.block_count * node_size;

        let physical_end = self.file.len()?;
        if offset < physical_end {
            let aligned = DATA_START_OFFSET + (physical_end - DATA_START_OFFSET).div_ceil(node_size) * node_size;
            warn!(
                path = %self.file.path().display(),
                expected = offset,
                physical_end,
                realigned = aligned,
                "index file longer than its block count, realigning allocation"
            );
            offset = aligned;
        }

        let addr = BlockAddr::new(offset);
        self.file.write_at(offset, &TreeNode::<K>::new_leaf(&self.geometry).encode(&self.geometry))?;
        self.block_count = (offset - DATA_START_OFFSET) / node_size + 1;
        Ok(addr)
    }

    // =========================================================================
    // Node I/O
    // =========================================================================

    fn check_offset(&self, addr: BlockAddr) -> Result<()> {
        let offset = addr.get();
        let node_size = self.geometry.node_size() as u64;

        let reason = if offset < DATA_START_OFFSET {
            "offset precedes the first node"
        } else if (offset - DATA_START_OFFSET) % node_size != 0 {
            "offset is not aligned to a node boundary"
        } else if (offset - DATA_START_OFFSET) / node_size >= self.block_count {
            "offset is past the last allocated node"
        } else {
            return Ok(());
        };

        error!(offset, node_size, reason, "invalid node offset");
        Err(RecError::InvalidOffset {
            offset,
            reason: reason.to_string(),
        })
    }

    fn read_node(&mut self, addr: BlockAddr) -> Result<TreeNode<K>> {
        self.check_offset(addr)?;
        if let Some(node) = self.cache.get(&addr) {
            return Ok(node.clone());
        }

        let mut buf = vec![0u8; self.geometry.node_size()];
        self.file.read_at(addr.get(), &mut buf)?;
        let node = TreeNode::decode(&buf, &self.geometry)?;

        self.cache.insert_clean(addr, node.clone());
        if self.cache.is_over_capacity() {
            self.flush_cache()?;
        }
        Ok(node)
    }

    fn write_node(&mut self, addr: BlockAddr, node: TreeNode<K>) -> Result<()> {
        self.check_offset(addr)?;
        self.cache.insert_dirty(addr, node);
        if self.cache.is_over_capacity() {
            self.flush_cache()?;
        }
        Ok(())
    }

    fn flush_cache(&mut self) -> Result<()> {
        let file = &mut self.file;
        let geometry = self.geometry;
        self.cache
            .flush(|addr, node| file.write_at(addr.get(), &node.encode(&geometry)))
    }
}

impl<K: IndexKey> Drop for IndexTree<K> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.flush() {
            error!(path = %self.file.path().display(), error = %e, "failed to flush index on drop");
        }
    }
}
