//! Shared storage types.

use std::fmt;

/// On-disk encoding of a null pointer (`-1` as a signed 64-bit integer).
pub(crate) const NULL_POINTER: u64 = u64::MAX;

/// Byte offset of a node inside an index file.
///
/// Distinct from [`RecordOffset`] and from key values so the three can never
/// be swapped by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockAddr(u64);

impl BlockAddr {
    pub const fn new(offset: u64) -> Self {
        Self(offset)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Decodes a raw pointer slot, mapping the null encoding to `None`.
    pub(crate) fn from_raw(raw: u64) -> Option<Self> {
        (raw != NULL_POINTER).then_some(Self(raw))
    }

    pub(crate) fn to_raw(addr: Option<Self>) -> u64 {
        addr.map(|a| a.0).unwrap_or(NULL_POINTER)
    }
}

impl fmt::Display for BlockAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block@{}", self.0)
    }
}

/// Absolute byte offset of a record inside the data file.
///
/// Directly seekable by any reader that knows the record size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordOffset(u64);

impl RecordOffset {
    pub const fn new(offset: u64) -> Self {
        Self(offset)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a point lookup together with its I/O cost.
///
/// `blocks_read` counts every bucket or node visited, whether it was served
/// from the cache or from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup<T> {
    /// The value found, or `None` when the key is absent
    pub value: Option<T>,
    /// Blocks visited to answer the lookup
    pub blocks_read: u64,
}

impl<T> Lookup<T> {
    pub fn found(value: T, blocks_read: u64) -> Self {
        Self {
            value: Some(value),
            blocks_read,
        }
    }

    pub fn not_found(blocks_read: u64) -> Self {
        Self {
            value: None,
            blocks_read,
        }
    }

    pub fn is_found(&self) -> bool {
        self.value.is_some()
    }
}
