//! Block geometry of the data file and the index files.
//!
//! Capacities are derived from the target block size and the record/key
//! width instead of being fixed at compile time.

use crate::error::{RecError, Result};
use crate::record::RECORD_SIZE;

use super::index::IndexKey;
use super::types::RecordOffset;

/// Default target block size in bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Layout of the hashed data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketGeometry {
    total_buckets: u64,
    records_per_bucket: usize,
}

impl BucketGeometry {
    /// Size of the trailing occupancy count (i32).
    pub const OCCUPANCY_SIZE: usize = 4;

    /// Geometry with an explicit bucket capacity.
    pub fn new(total_buckets: u64, records_per_bucket: usize) -> Result<Self> {
        if total_buckets == 0 {
            return Err(RecError::Config("total_buckets must be nonzero".to_string()));
        }
        if records_per_bucket == 0 || records_per_bucket > i32::MAX as usize {
            return Err(RecError::Config(format!(
                "records_per_bucket out of range: {}",
                records_per_bucket
            )));
        }
        Ok(Self {
            total_buckets,
            records_per_bucket,
        })
    }

    /// Largest bucket capacity whose footprint fits in `block_size`.
    pub fn for_block_size(total_buckets: u64, block_size: usize) -> Result<Self> {
        let per_bucket = block_size.saturating_sub(Self::OCCUPANCY_SIZE) / RECORD_SIZE;
        if per_bucket == 0 {
            return Err(RecError::Config(format!(
                "block size {} cannot hold a {}-byte record",
                block_size, RECORD_SIZE
            )));
        }
        Self::new(total_buckets, per_bucket)
    }

    pub fn total_buckets(&self) -> u64 {
        self.total_buckets
    }

    pub fn records_per_bucket(&self) -> usize {
        self.records_per_bucket
    }

    pub fn record_size(&self) -> usize {
        RECORD_SIZE
    }

    /// Bytes per bucket: records first, occupancy last.
    pub fn bucket_size(&self) -> usize {
        self.records_per_bucket * RECORD_SIZE + Self::OCCUPANCY_SIZE
    }

    /// Expected length of a fully initialized data file.
    pub fn file_size(&self) -> u64 {
        self.total_buckets * self.bucket_size() as u64
    }

    /// Byte offset of a bucket.
    pub fn bucket_offset(&self, bucket: u64) -> u64 {
        bucket * self.bucket_size() as u64
    }

    /// Address of the record stored at `slot` of `bucket`.
    pub fn record_offset(&self, bucket: u64, slot: usize) -> RecordOffset {
        RecordOffset::new(self.bucket_offset(bucket) + (slot * RECORD_SIZE) as u64)
    }

    /// Inverse of [`record_offset`](Self::record_offset). `None` if the offset
    /// does not point at the start of a record slot.
    pub fn locate(&self, offset: RecordOffset) -> Option<(u64, usize)> {
        let bucket_size = self.bucket_size() as u64;
        let bucket = offset.get() / bucket_size;
        let within = offset.get() % bucket_size;
        if bucket >= self.total_buckets || within % RECORD_SIZE as u64 != 0 {
            return None;
        }
        let slot = (within / RECORD_SIZE as u64) as usize;
        (slot < self.records_per_bucket).then_some((bucket, slot))
    }
}

/// Layout of one B+Tree node for a given key width.
///
/// ```text
/// is_leaf (1) | key_count (4) | keys[order-1] | children[order] (8 each) | next_leaf (8)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeGeometry {
    order: usize,
    key_width: usize,
}

impl TreeGeometry {
    /// Smallest order that still allows a split to leave both halves non-empty.
    pub const MIN_ORDER: usize = 3;

    const FIXED_SIZE: usize = 1 + 4 + 8;
    const CHILD_SIZE: usize = 8;

    /// Geometry with an explicit order.
    pub fn with_order<K: IndexKey>(order: usize) -> Result<Self> {
        if order < Self::MIN_ORDER {
            return Err(RecError::Config(format!(
                "B+Tree order must be at least {}, got {}",
                Self::MIN_ORDER,
                order
            )));
        }
        Ok(Self {
            order,
            key_width: K::WIDTH,
        })
    }

    /// Largest order whose node fits in `block_size`.
    ///
    /// Solves `13 + W*(m-1) + 8*m <= block_size` for `m`.
    pub fn for_block_size<K: IndexKey>(block_size: usize) -> Result<Self> {
        let order = (block_size + K::WIDTH).saturating_sub(Self::FIXED_SIZE)
            / (K::WIDTH + Self::CHILD_SIZE);
        Self::with_order::<K>(order)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Maximum keys per node.
    pub fn max_keys(&self) -> usize {
        self.order - 1
    }

    pub fn key_width(&self) -> usize {
        self.key_width
    }

    /// Encoded bytes per node.
    pub fn node_size(&self) -> usize {
        Self::FIXED_SIZE + self.key_width * (self.order - 1) + Self::CHILD_SIZE * self.order
    }
}
