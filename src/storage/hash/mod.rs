//! Hashed Data File
//!
//! Persistent bucket table mapping `id -> bucket -> slot`.
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ Bucket 0                                             │
//! │ ┌──────────┬──────────┬─────┬──────────────────────┐ │
//! │ │ Record 0 │ Record 1 │ ... │ Occupancy (i32 LE)   │ │
//! │ └──────────┴──────────┴─────┴──────────────────────┘ │
//! ├──────────────────────────────────────────────────────┤
//! │ Bucket 1 ... Bucket N-1                              │
//! └──────────────────────────────────────────────────────┘
//! ```
//! No file header: the bucket count is supplied by the caller on every open.

mod bucket;
mod store;

pub use bucket::Bucket;
pub use store::HashStore;
