//! Configuration for recdb
//!
//! Centralized configuration with sensible defaults. The on-disk geometry of
//! the data file and of both indexes is derived from this configuration, so
//! the same values must be supplied every time an existing database is opened.

use std::path::PathBuf;

use crate::error::{RecError, Result};
use crate::storage::{BucketGeometry, IndexKey, TreeGeometry, DEFAULT_BLOCK_SIZE};

/// Main configuration for a recdb instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── data_file.dat        (hashed record buckets)
    ///     ├── primary_index.idx    (B+Tree by id)
    ///     └── secondary_index.idx  (B+Tree by title hash)
    pub data_dir: PathBuf,

    /// Target size of one storage block (bucket or tree node) in bytes
    pub block_size: usize,

    // -------------------------------------------------------------------------
    // Hash File Configuration
    // -------------------------------------------------------------------------
    /// Number of buckets in the data file. Not persisted: must match the
    /// value used when the file was created.
    pub total_buckets: u64,

    /// Records per bucket. Derived from `block_size` when unset.
    pub records_per_bucket: Option<usize>,

    /// Max buckets held in the write-back cache before a full flush
    pub hash_cache_capacity: usize,

    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// B+Tree order. Derived per key width from `block_size` when unset.
    pub index_order: Option<usize>,

    /// Max nodes held in each index's write-back cache before a full flush
    pub index_cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            block_size: DEFAULT_BLOCK_SIZE,
            total_buckets: 1000,
            records_per_bucket: None,
            hash_cache_capacity: 1024,
            index_order: None,
            index_cache_capacity: 2000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Geometry of the hashed data file described by this config
    ///
    /// An explicit `records_per_bucket` must still fit in `block_size`.
    pub fn bucket_geometry(&self) -> Result<BucketGeometry> {
        let Some(per_bucket) = self.records_per_bucket else {
            return BucketGeometry::for_block_size(self.total_buckets, self.block_size);
        };

        let geometry = BucketGeometry::new(self.total_buckets, per_bucket)?;
        if geometry.bucket_size() > self.block_size {
            return Err(RecError::Config(format!(
                "{} records per bucket need {} bytes, block size is {}",
                per_bucket,
                geometry.bucket_size(),
                self.block_size
            )));
        }
        Ok(geometry)
    }

    /// Geometry of an index over keys of type `K`
    ///
    /// An explicit `index_order` must still fit in `block_size`.
    pub fn tree_geometry<K: IndexKey>(&self) -> Result<TreeGeometry> {
        let Some(order) = self.index_order else {
            return TreeGeometry::for_block_size::<K>(self.block_size);
        };

        let geometry = TreeGeometry::with_order::<K>(order)?;
        if geometry.node_size() > self.block_size {
            return Err(RecError::Config(format!(
                "index order {} needs {}-byte nodes, block size is {}",
                order,
                geometry.node_size(),
                self.block_size
            )));
        }
        Ok(geometry)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the target block size (in bytes)
    pub fn block_size(mut self, size: usize) -> Self {
        self.config.block_size = size;
        self
    }

    /// Set the number of hash buckets
    pub fn total_buckets(mut self, count: u64) -> Self {
        self.config.total_buckets = count;
        self
    }

    /// Override the number of records per bucket
    pub fn records_per_bucket(mut self, count: usize) -> Self {
        self.config.records_per_bucket = Some(count);
        self
    }

    /// Set the bucket cache capacity
    pub fn hash_cache_capacity(mut self, buckets: usize) -> Self {
        self.config.hash_cache_capacity = buckets;
        self
    }

    /// Override the B+Tree order used by both indexes
    pub fn index_order(mut self, order: usize) -> Self {
        self.config.index_order = Some(order);
        self
    }

    /// Set the node cache capacity of each index
    pub fn index_cache_capacity(mut self, nodes: usize) -> Self {
        self.config.index_cache_capacity = nodes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
