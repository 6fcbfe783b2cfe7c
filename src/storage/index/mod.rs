//! B+Tree Index Files
//!
//! Maps a fixed-width key to a [`RecordOffset`](crate::storage::RecordOffset)
//! in the data file. The primary index is keyed by record id (`i32`), the
//! secondary by title hash (`i64`).
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Header (16 bytes)                            │
//! │   root_offset: u64 LE | block_count: u64 LE  │
//! ├──────────────────────────────────────────────┤
//! │ Node 0 @ 16                                  │
//! │ ┌────────┬───────────┬──────────┬──────────┬──────────┐
//! │ │is_leaf │ key_count │ keys     │ pointers │next_leaf │
//! │ │ u8     │ u32 LE    │ K×(m-1)  │ u64×m    │ u64      │
//! │ └────────┴───────────┴──────────┴──────────┴──────────┘
//! ├──────────────────────────────────────────────┤
//! │ Node 1 @ 16 + node_size ...                  │
//! └──────────────────────────────────────────────┘
//! ```
//! Null pointers are stored as all-ones (`-1` as i64). In a leaf, `pointers[i]`
//! is the record offset for `keys[i]`; in an internal node, `pointers[i]` is
//! the child holding keys below `keys[i]`.

mod key;
mod meta;
mod node;
mod tree;

pub use key::IndexKey;
pub use meta::{IndexMetadata, DATA_START_OFFSET, HEADER_SIZE};
pub use node::TreeNode;
pub use tree::IndexTree;
