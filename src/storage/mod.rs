//! Storage Module
//!
//! Block-oriented persistence for records and their indexes.
//!
//! ## Responsibilities
//! - Store records in a static hashed data file ([`HashStore`])
//! - Map keys to record offsets in on-disk B+Trees ([`IndexTree`])
//! - Keep recently used blocks in memory with write-back ([`BlockCache`])
//!
//! ## Layout
//! ```text
//! data_dir/
//! ├── data_file.dat        buckets of fixed-size records
//! ├── primary_index.idx    IndexTree<i32>  id → offset
//! └── secondary_index.idx  IndexTree<i64>  title hash → offset
//! ```
//! All integers on disk are little-endian.

mod block_file;
pub mod cache;
mod geometry;
pub mod hash;
pub mod index;
mod types;

pub use cache::{BlockCache, CacheStats};
pub use geometry::{BucketGeometry, TreeGeometry, DEFAULT_BLOCK_SIZE};
pub use hash::{Bucket, HashStore};
pub use index::{IndexKey, IndexTree};
pub use types::{BlockAddr, Lookup, RecordOffset};
