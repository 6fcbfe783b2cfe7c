//! Block Cache
//!
//! Bounded write-back cache shared by the hash store and the index trees.
//!
//! ## Policy
//! - Reads populate the cache with clean entries
//! - Writes replace the cached copy and mark it dirty
//! - Once the entry count exceeds `capacity`, the owner flushes: every dirty
//!   entry is handed to a writer callback (in key order) and the cache is
//!   emptied
//! - The owner flushes unconditionally before releasing its file
//!
//! The cache knows nothing about files; I/O happens in the callback so the
//! policy can be exercised on its own.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::Result;

/// Counters describing cache behaviour since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Full flushes performed
    pub flushes: u64,
    /// Dirty entries written back across all flushes
    pub written_back: u64,
}

struct CacheEntry<V> {
    value: V,
    dirty: bool,
}

/// Bounded write-back cache keyed by block address.
pub struct BlockCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    capacity: usize,
    stats: CacheStats,
}

impl<K, V> BlockCache<K, V>
where
    K: Copy + Eq + Hash + Ord,
{
    /// Create a cache that holds at most `capacity` entries between flushes.
    /// A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            stats: CacheStats::default(),
        }
    }

    /// Look up a cached block, recording a hit or a miss.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        match self.entries.get(key) {
            Some(entry) => {
                self.stats.hits += 1;
                Some(&entry.value)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Cache a block that matches its on-disk copy.
    ///
    /// Never downgrades a dirty entry: if the key is already dirty the cached
    /// copy is kept.
    pub fn insert_clean(&mut self, key: K, value: V) {
        self.entries
            .entry(key)
            .or_insert(CacheEntry { value, dirty: false });
    }

    /// Cache a modified block that must be written back.
    pub fn insert_dirty(&mut self, key: K, value: V) {
        self.entries.insert(key, CacheEntry { value, dirty: true });
    }

    /// True once the entry count has exceeded the bound.
    pub fn is_over_capacity(&self) -> bool {
        self.entries.len() > self.capacity
    }

    /// Write every dirty entry through `write`, in ascending key order, then
    /// empty the cache.
    ///
    /// On a write failure the cache keeps all entries (including the one that
    /// failed) so a later flush can retry them.
    pub fn flush<F>(&mut self, mut write: F) -> Result<()>
    where
        F: FnMut(K, &V) -> Result<()>,
    {
        let mut dirty: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.dirty)
            .map(|(key, _)| *key)
            .collect();
        dirty.sort_unstable();

        for key in dirty {
            if let Some(entry) = self.entries.get_mut(&key) {
                write(key, &entry.value)?;
                entry.dirty = false;
                self.stats.written_back += 1;
            }
        }

        self.entries.clear();
        self.stats.flushes += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dirty_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.dirty).count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
