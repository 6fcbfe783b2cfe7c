//! Hash Store
//!
//! Bucket file addressed by `id mod total_buckets` with linear probing.

use std::path::Path;

use tracing::{debug, error, warn};

use crate::error::{RecError, Result};
use crate::record::{self, Record};
use crate::storage::block_file::BlockFile;
use crate::storage::cache::{BlockCache, CacheStats};
use crate::storage::{BucketGeometry, Lookup, RecordOffset};

use super::Bucket;

/// Buckets written per I/O call while initializing a new file
const INIT_BATCH: u64 = 256;

/// Hashed data file with a write-back bucket cache
///
/// ## Probing contract
/// Insert places a record in the first bucket with free room, starting at its
/// home bucket and wrapping at the end of the table. Because buckets never
/// lose records, a record can only live before the first non-full bucket of
/// its probe sequence, so lookups stop there.
pub struct HashStore {
    /// Exclusive handle on the data file
    file: BlockFile,

    /// Bucket layout; `total_buckets` must match the file's creator
    geometry: BucketGeometry,

    /// Bucket index → in-memory bucket
    cache: BlockCache<u64, Bucket>,

    /// Set once `close()` has flushed successfully
    closed: bool,
}

impl HashStore {
    /// Open an existing data file or create one with every bucket empty
    ///
    /// The bucket count is not stored in the file. An existing file whose
    /// length disagrees with `geometry` is rejected.
    pub fn open(path: &Path, geometry: BucketGeometry, cache_capacity: usize) -> Result<Self> {
        let mut file = BlockFile::open(path)?;
        let len = file.len()?;

        if len == 0 {
            Self::initialize(&mut file, &geometry)?;
            debug!(
                path = %path.display(),
                buckets = geometry.total_buckets(),
                bucket_size = geometry.bucket_size(),
                "created data file"
            );
        } else if len != geometry.file_size() {
            return Err(RecError::Config(format!(
                "data file {} is {} bytes, expected {} for {} buckets of {} bytes",
                path.display(),
                len,
                geometry.file_size(),
                geometry.total_buckets(),
                geometry.bucket_size()
            )));
        } else {
            debug!(path = %path.display(), buckets = geometry.total_buckets(), "opened data file");
        }

        Ok(Self {
            file,
            geometry,
            cache: BlockCache::new(cache_capacity),
            closed: false,
        })
    }

    /// Home bucket of a key
    pub fn hash_function(&self, key: i32) -> u64 {
        (key as i128).rem_euclid(self.geometry.total_buckets() as i128) as u64
    }

    /// Insert a record, returning its offset in the data file
    ///
    /// Returns `Ok(None)` when every bucket is full.
    pub fn insert(&mut self, record: &Record) -> Result<Option<RecordOffset>> {
        record::validate(record)?;

        let total = self.geometry.total_buckets();
        let capacity = self.geometry.records_per_bucket();
        let home = self.hash_function(record.id);

        for step in 0..total {
            let index = (home + step) % total;
            let mut bucket = self.read_bucket(index)?;

            if bucket.occupancy() < capacity {
                let slot = bucket.push(record.clone());
                self.write_bucket(index, bucket)?;
                return Ok(Some(self.geometry.record_offset(index, slot)));
            }
        }

        warn!(id = record.id, buckets = total, "data file is full, record rejected");
        Ok(None)
    }

    /// Look up a record by id, counting every bucket visited
    pub fn find_by_id(&mut self, id: i32) -> Result<Lookup<Record>> {
        let total = self.geometry.total_buckets();
        let capacity = self.geometry.records_per_bucket();
        let home = self.hash_function(id);
        let mut blocks_read = 0;

        for step in 0..total {
            let index = (home + step) % total;
            let bucket = self.read_bucket(index)?;
            blocks_read += 1;

            if let Some(found) = bucket.records().iter().find(|r| r.id == id) {
                return Ok(Lookup::found(found.clone(), blocks_read));
            }

            // A gap ends the probe sequence
            if bucket.occupancy() < capacity {
                break;
            }
        }

        Ok(Lookup::not_found(blocks_read))
    }

    /// Read the record stored at `offset`
    ///
    /// An offset that is not the start of a record slot is an error; an
    /// unoccupied slot is reported as not found.
    pub fn read_at(&mut self, offset: RecordOffset) -> Result<Lookup<Record>> {
        let (index, slot) = self.geometry.locate(offset).ok_or_else(|| RecError::InvalidOffset {
            offset: offset.get(),
            reason: "not the start of a record slot in the data file".to_string(),
        })?;

        let bucket = self.read_bucket(index)?;
        Ok(match bucket.record(slot) {
            Some(record) => Lookup::found(record.clone(), 1),
            None => Lookup::not_found(1),
        })
    }

    /// Write every dirty bucket back and sync the file
    pub fn flush(&mut self) -> Result<()> {
        self.flush_cache()?;
        self.file.sync()
    }

    /// Flush and release the file
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        self.closed = true;
        debug!(path = %self.file.path().display(), "closed data file");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn geometry(&self) -> &BucketGeometry {
        &self.geometry
    }

    pub fn total_buckets(&self) -> u64 {
        self.geometry.total_buckets()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn initialize(file: &mut BlockFile, geometry: &BucketGeometry) -> Result<()> {
        let empty = Bucket::default().encode(geometry)?;
        let total = geometry.total_buckets();

        let mut index = 0;
        while index < total {
            let count = INIT_BATCH.min(total - index);
            let batch = empty.repeat(count as usize);
            file.write_at(geometry.bucket_offset(index), &batch)?;
            index += count;
        }
        file.sync()
    }

    fn read_bucket(&mut self, index: u64) -> Result<Bucket> {
        if let Some(bucket) = self.cache.get(&index) {
            return Ok(bucket.clone());
        }

        let mut buf = vec![0u8; self.geometry.bucket_size()];
        self.file.read_at(self.geometry.bucket_offset(index), &mut buf)?;
        let bucket = Bucket::decode(&buf, &self.geometry)?;

        self.cache.insert_clean(index, bucket.clone());
        if self.cache.is_over_capacity() {
            self.flush_cache()?;
        }
        Ok(bucket)
    }

    fn write_bucket(&mut self, index: u64, bucket: Bucket) -> Result<()> {
        self.cache.insert_dirty(index, bucket);
        if self.cache.is_over_capacity() {
            self.flush_cache()?;
        }
        Ok(())
    }

    fn flush_cache(&mut self) -> Result<()> {
        let file = &mut self.file;
        let geometry = self.geometry;
        self.cache.flush(|index, bucket| {
            let bytes = bucket.encode(&geometry)?;
            file.write_at(geometry.bucket_offset(index), &bytes)
        })
    }
}

impl Drop for HashStore {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.flush() {
            error!(path = %self.file.path().display(), error = %e, "failed to flush data file on drop");
        }
    }
}
