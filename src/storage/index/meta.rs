//! Index file header.

use serde::{Deserialize, Serialize};

use crate::error::{RecError, Result};
use crate::storage::{BlockAddr, TreeGeometry};

/// Size of the serialized header: two little-endian u64 fields.
pub const HEADER_SIZE: u64 = 16;

/// Offset of the first node, immediately after the header.
pub const DATA_START_OFFSET: u64 = HEADER_SIZE;

/// Persistent tree state, written at creation and on every flush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Offset of the current root node
    pub root_offset: u64,
    /// Number of node blocks allocated after the header
    pub block_count: u64,
}

impl IndexMetadata {
    /// Header of a freshly created file holding one empty root leaf.
    pub fn initial() -> Self {
        Self {
            root_offset: DATA_START_OFFSET,
            block_count: 1,
        }
    }

    pub fn root(&self) -> BlockAddr {
        BlockAddr::new(self.root_offset)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let bytes = bincode::serialize(self)?;
        debug_assert_eq!(bytes.len() as u64, HEADER_SIZE);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Reject headers that cannot describe `file_len` bytes of nodes laid out
    /// with `geometry`.
    pub fn validate(&self, geometry: &TreeGeometry, file_len: u64) -> Result<()> {
        let node_size = geometry.node_size() as u64;

        if self.block_count == 0 {
            return Err(RecError::Metadata("block_count is zero".to_string()));
        }
        if self.root_offset < DATA_START_OFFSET {
            return Err(RecError::Metadata(format!(
                "root offset {} precedes the first node at {}",
                self.root_offset, DATA_START_OFFSET
            )));
        }
        if (self.root_offset - DATA_START_OFFSET) % node_size != 0 {
            return Err(RecError::Metadata(format!(
                "root offset {} is not aligned to {}-byte nodes",
                self.root_offset, node_size
            )));
        }

        let allocated_end = self
            .block_count
            .checked_mul(node_size)
            .and_then(|bytes| bytes.checked_add(DATA_START_OFFSET))
            .ok_or_else(|| {
                RecError::Metadata(format!("block_count {} overflows", self.block_count))
            })?;
        if self.root_offset.saturating_add(node_size) > allocated_end {
            return Err(RecError::Metadata(format!(
                "root offset {} outside the {} allocated blocks",
                self.root_offset, self.block_count
            )));
        }
        if allocated_end > file_len {
            return Err(RecError::Metadata(format!(
                "{} blocks of {} bytes need {} bytes, file has {}",
                self.block_count, node_size, allocated_end, file_len
            )));
        }

        Ok(())
    }
}
