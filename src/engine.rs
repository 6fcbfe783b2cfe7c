//! Engine Module
//!
//! The database that coordinates the data file and both indexes.
//!
//! ## Responsibilities
//! - Open or create all three files under one data directory
//! - Keep the indexes in step with the data file on insert
//! - Answer point lookups by id and by title, reporting blocks read
//! - Flush every store before the handles are released

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::record::Record;
use crate::storage::{HashStore, IndexTree, RecordOffset};

/// Result of a point lookup through the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLookup {
    /// The matching record, `None` when absent
    pub record: Option<Record>,

    /// Index nodes visited (zero for hash-file lookups)
    pub index_blocks_read: u64,

    /// Data-file buckets visited
    pub data_blocks_read: u64,
}

impl RecordLookup {
    pub fn is_found(&self) -> bool {
        self.record.is_some()
    }
}

/// Outcome of [`Database::insert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Stored in the data file and both indexes
    Stored(RecordOffset),

    /// The id is already stored at this offset; nothing was written
    DuplicateId(RecordOffset),

    /// No bucket had room; nothing was written
    TableFull,
}

impl InsertOutcome {
    /// Offset of the newly stored record
    pub fn offset(&self) -> Option<RecordOffset> {
        match self {
            InsertOutcome::Stored(offset) => Some(*offset),
            _ => None,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, InsertOutcome::Stored(_))
    }
}

/// The storage engine
///
/// ## Write path
/// `HashStore::insert` → primary `insert(id, offset)` →
/// secondary `insert(title_hash, offset)`. Records are immutable: an id that
/// is already indexed is rejected, and so is a record that finds no room.
/// Neither case touches any of the three files.
///
/// ## Read paths
/// - by id through the hash file (`find_by_id`)
/// - by id through the primary index (`get_by_id`)
/// - by title through the secondary index (`get_by_title`), verified against
///   the stored title since distinct titles may share a hash
pub struct Database {
    /// Database configuration
    config: Config,

    /// Hashed data file
    data: HashStore,

    /// id → record offset
    primary: IndexTree<i32>,

    /// title hash → record offset
    secondary: IndexTree<i64>,
}

impl Database {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const DATA_FILENAME: &'static str = "data_file.dat";
    const PRIMARY_INDEX_FILENAME: &'static str = "primary_index.idx";
    const SECONDARY_INDEX_FILENAME: &'static str = "secondary_index.idx";

    /// Open or create a database with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Derive geometry for the data file and each index
    /// 3. Open or create each file, validating existing ones
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let bucket_geometry = config.bucket_geometry()?;
        let primary_geometry = config.tree_geometry::<i32>()?;
        let secondary_geometry = config.tree_geometry::<i64>()?;

        let data = HashStore::open(
            &config.data_dir.join(Self::DATA_FILENAME),
            bucket_geometry,
            config.hash_cache_capacity,
        )?;
        let primary = IndexTree::open(
            &config.data_dir.join(Self::PRIMARY_INDEX_FILENAME),
            primary_geometry,
            config.index_cache_capacity,
        )?;
        let secondary = IndexTree::open(
            &config.data_dir.join(Self::SECONDARY_INDEX_FILENAME),
            secondary_geometry,
            config.index_cache_capacity,
        )?;

        info!(
            data_dir = %config.data_dir.display(),
            buckets = bucket_geometry.total_buckets(),
            records_per_bucket = bucket_geometry.records_per_bucket(),
            primary_order = primary_geometry.order(),
            secondary_order = secondary_geometry.order(),
            "database opened"
        );

        Ok(Self {
            config,
            data,
            primary,
            secondary,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Store a record and index it by id and by title hash
    pub fn insert(&mut self, record: &Record) -> Result<InsertOutcome> {
        if let Some(existing) = self.primary.search(record.id)?.value {
            warn!(id = record.id, offset = %existing, "id already stored, record not stored");
            return Ok(InsertOutcome::DuplicateId(existing));
        }

        let Some(offset) = self.data.insert(record)? else {
            warn!(id = record.id, "data file full, record not stored");
            return Ok(InsertOutcome::TableFull);
        };

        self.primary.insert(record.id, offset)?;
        self.secondary.insert(record.title_hash(), offset)?;
        Ok(InsertOutcome::Stored(offset))
    }

    /// Look up a record by id by probing the hash file directly
    pub fn find_by_id(&mut self, id: i32) -> Result<RecordLookup> {
        let lookup = self.data.find_by_id(id)?;
        Ok(RecordLookup {
            record: lookup.value,
            index_blocks_read: 0,
            data_blocks_read: lookup.blocks_read,
        })
    }

    /// Look up a record by id through the primary index
    pub fn get_by_id(&mut self, id: i32) -> Result<RecordLookup> {
        let index = self.primary.search(id)?;
        let Some(offset) = index.value else {
            return Ok(RecordLookup {
                record: None,
                index_blocks_read: index.blocks_read,
                data_blocks_read: 0,
            });
        };

        let data = self.data.read_at(offset)?;
        Ok(RecordLookup {
            record: data.value,
            index_blocks_read: index.blocks_read,
            data_blocks_read: data.blocks_read,
        })
    }

    /// Look up a record by exact title through the secondary index
    ///
    /// A hash hit whose stored title differs is a collision and reported as
    /// not found.
    pub fn get_by_title(&mut self, title: &str) -> Result<RecordLookup> {
        let hash = crate::record::title_hash(title);
        let index = self.secondary.search(hash)?;
        let Some(offset) = index.value else {
            return Ok(RecordLookup {
                record: None,
                index_blocks_read: index.blocks_read,
                data_blocks_read: 0,
            });
        };

        let data = self.data.read_at(offset)?;
        let record = data.value.filter(|record| {
            let matches = record.title == title;
            if !matches {
                debug!(hash, offset = %offset, stored = %record.title, "title hash collision");
            }
            matches
        });

        Ok(RecordLookup {
            record,
            index_blocks_read: index.blocks_read,
            data_blocks_read: data.blocks_read,
        })
    }

    /// Write every dirty bucket and node, then both index headers
    pub fn flush(&mut self) -> Result<()> {
        self.data.flush()?;
        self.primary.flush()?;
        self.secondary.flush()
    }

    /// Close the database gracefully
    ///
    /// Stores not yet closed when an earlier one fails are still flushed by
    /// their own `Drop`.
    pub fn close(self) -> Result<()> {
        let Self {
            config,
            data,
            primary,
            secondary,
        } = self;

        data.close()?;
        primary.close()?;
        secondary.close()?;

        debug!(data_dir = %config.data_dir.display(), "database closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for metrics and testing)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of buckets (blocks) in the data file
    pub fn data_blocks(&self) -> u64 {
        self.data.total_buckets()
    }

    /// Number of node blocks in the primary index file
    pub fn primary_blocks(&self) -> u64 {
        self.primary.block_count()
    }

    /// Number of node blocks in the secondary index file
    pub fn secondary_blocks(&self) -> u64 {
        self.secondary.block_count()
    }

    pub fn primary_index(&mut self) -> &mut IndexTree<i32> {
        &mut self.primary
    }

    pub fn secondary_index(&mut self) -> &mut IndexTree<i64> {
        &mut self.secondary
    }
}
