//! Record Module
//!
//! The logical article record and its fixed-width binary encoding.
//!
//! ## Record Layout (1497 bytes, little-endian)
//! ```text
//! ┌──────────┬─────────────┬──────────┬─────────────┬───────────────┐
//! │ id (4)   │ title (301) │ year (4) │authors (151)│ citations (4) │
//! ├──────────┴──────┬──────┴──────────┴─────────────┴───────────────┘
//! │ updated_at (8)  │ snippet (1025) │
//! └─────────────────┴────────────────┘
//! ```
//! Text fields are zero padded; the stored text ends at the first NUL byte,
//! so each slot holds at most `width - 1` bytes of UTF-8.

mod codec;

pub use codec::{decode, encode, encode_into, validate};

/// Max bytes of title text
pub const TITLE_MAX: usize = 300;

/// Max bytes of authors text
pub const AUTHORS_MAX: usize = 150;

/// Max bytes of snippet text
pub const SNIPPET_MAX: usize = 1024;

/// Encoded size of one record: 4 + 301 + 4 + 151 + 4 + 8 + 1025
pub const RECORD_SIZE: usize =
    4 + (TITLE_MAX + 1) + 4 + (AUTHORS_MAX + 1) + 4 + 8 + (SNIPPET_MAX + 1);

/// One article stored in the data file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// Primary key
    pub id: i32,
    /// Article title, at most [`TITLE_MAX`] bytes
    pub title: String,
    /// Publication year
    pub year: i32,
    /// Author list, at most [`AUTHORS_MAX`] bytes
    pub authors: String,
    /// Citation count
    pub citations: i32,
    /// Last update as unix seconds
    pub updated_at: i64,
    /// Text snippet, at most [`SNIPPET_MAX`] bytes
    pub snippet: String,
}

impl Record {
    /// Create a record with the given id and title; remaining fields are zero
    pub fn new(id: i32, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ..Self::default()
        }
    }

    /// Secondary key of this record
    pub fn title_hash(&self) -> i64 {
        title_hash(&self.title)
    }

    /// Truncate `text` to at most `max` bytes without splitting a character.
    /// Embedded NUL bytes are dropped since they terminate stored text.
    pub fn fit_text(text: &str, max: usize) -> String {
        let mut out = String::with_capacity(text.len().min(max));
        for ch in text.chars().filter(|&c| c != '\0') {
            if out.len() + ch.len_utf8() > max {
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// 64-bit FNV-1a hash of a title, used as the secondary index key.
///
/// The hash is stable across runs and platforms, which the on-disk index
/// depends on.
pub fn title_hash(title: &str) -> i64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in title.as_bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash as i64
}
