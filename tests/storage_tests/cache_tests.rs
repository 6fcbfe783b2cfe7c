//! Tests for BlockCache
//!
//! These tests verify:
//! - Hit/miss accounting
//! - Dirty tracking and clean inserts
//! - Flush order, write-back counts and clearing
//! - Failed flushes keep entries for retry

use recdb::storage::{BlockCache, CacheStats};
use recdb::RecError;

// =============================================================================
// Helper Functions
// =============================================================================

/// Flush and collect what the cache wrote back
fn flush_collect(cache: &mut BlockCache<u64, String>) -> Vec<(u64, String)> {
    let mut written = Vec::new();
    cache
        .flush(|key, value| {
            written.push((key, value.clone()));
            Ok(())
        })
        .unwrap();
    written
}

// =============================================================================
// Lookup Tests
// =============================================================================

#[test]
fn test_get_counts_hits_and_misses() {
    let mut cache = BlockCache::new(4);
    cache.insert_clean(1u64, "one".to_string());

    assert_eq!(cache.get(&1).map(String::as_str), Some("one"));
    assert!(cache.get(&2).is_none());

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[test]
fn test_zero_capacity_treated_as_one() {
    let mut cache: BlockCache<u64, String> = BlockCache::new(0);
    assert_eq!(cache.capacity(), 1);

    cache.insert_clean(1, "a".to_string());
    assert!(!cache.is_over_capacity());
    cache.insert_clean(2, "b".to_string());
    assert!(cache.is_over_capacity());
}

// =============================================================================
// Dirty Tracking Tests
// =============================================================================

#[test]
fn test_clean_insert_does_not_overwrite_dirty() {
    let mut cache = BlockCache::new(4);
    cache.insert_dirty(7u64, "new".to_string());
    cache.insert_clean(7, "stale".to_string());

    assert_eq!(cache.get(&7).map(String::as_str), Some("new"));
    assert_eq!(cache.dirty_count(), 1);
}

#[test]
fn test_dirty_insert_replaces_clean() {
    let mut cache = BlockCache::new(4);
    cache.insert_clean(7u64, "old".to_string());
    cache.insert_dirty(7, "new".to_string());

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.dirty_count(), 1);
    assert_eq!(cache.get(&7).map(String::as_str), Some("new"));
}

// =============================================================================
// Flush Tests
// =============================================================================

#[test]
fn test_flush_writes_dirty_in_key_order_and_clears() {
    let mut cache = BlockCache::new(8);
    cache.insert_dirty(30u64, "c".to_string());
    cache.insert_clean(20, "clean".to_string());
    cache.insert_dirty(10, "a".to_string());

    let written = flush_collect(&mut cache);

    assert_eq!(written, vec![(10, "a".to_string()), (30, "c".to_string())]);
    assert!(cache.is_empty());
    assert_eq!(
        cache.stats(),
        CacheStats {
            hits: 0,
            misses: 0,
            flushes: 1,
            written_back: 2,
        }
    );
}

#[test]
fn test_flush_empty_cache() {
    let mut cache: BlockCache<u64, String> = BlockCache::new(2);

    assert!(flush_collect(&mut cache).is_empty());
    assert_eq!(cache.stats().flushes, 1);
}

#[test]
fn test_failed_flush_keeps_entries() {
    let mut cache = BlockCache::new(8);
    cache.insert_dirty(1u64, "a".to_string());
    cache.insert_dirty(2, "b".to_string());

    let result = cache.flush(|key, _| {
        if key == 2 {
            Err(RecError::Corruption("disk full".to_string()))
        } else {
            Ok(())
        }
    });

    assert!(result.is_err());
    assert_eq!(cache.len(), 2);
    // Key 1 was written before the failure
    assert_eq!(cache.dirty_count(), 1);

    let written = flush_collect(&mut cache);
    assert_eq!(written, vec![(2, "b".to_string())]);
    assert!(cache.is_empty());
}
