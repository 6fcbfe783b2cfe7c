//! # recdb
//!
//! A small disk-based record store with:
//! - A static hashed data file with linear probing
//! - A primary B+Tree index by record id
//! - A secondary B+Tree index by title hash
//! - Write-back block caches with I/O accounting
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      recdb CLI                              │
//! │            (upload / findrec / seek1 / seek2)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Database                                │
//! │        (insert, find_by_id, get_by_id, get_by_title)        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼──────────────────────┐
//!          │            │                      │
//!          ▼            ▼                      ▼
//!   ┌─────────────┐ ┌──────────────────┐ ┌───────────────────┐
//!   │  HashStore  │ │ IndexTree<i32>   │ │ IndexTree<i64>    │
//!   │  (buckets)  │ │ (id → offset)    │ │ (hash → offset)   │
//!   └──────┬──────┘ └────────┬─────────┘ └─────────┬─────────┘
//!          │                 │                     │
//!          ▼                 ▼                     ▼
//!   ┌─────────────────────────────────────────────────────────┐
//!   │        BlockCache (write-back, one per store)           │
//!   └─────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod storage;
pub mod engine;
pub mod loader;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RecError, Result};
pub use config::Config;
pub use engine::{Database, InsertOutcome, RecordLookup};
pub use record::Record;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of recdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
