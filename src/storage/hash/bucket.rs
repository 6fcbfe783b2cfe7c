//! In-memory bucket and its on-disk layout.

use bytes::{Buf, BufMut};

use crate::error::{RecError, Result};
use crate::record::{self, Record, RECORD_SIZE};
use crate::storage::BucketGeometry;

/// Occupied prefix of a bucket's record slots.
///
/// Holds at most `records_per_bucket` records; the count doubles as the
/// occupancy field written at the end of the block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bucket {
    records: Vec<Record>,
}

impl Bucket {
    pub fn occupancy(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, slot: usize) -> Option<&Record> {
        self.records.get(slot)
    }

    /// Append a record, returning its slot index.
    pub(crate) fn push(&mut self, record: Record) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    /// Encode into exactly `geometry.bucket_size()` bytes.
    pub(crate) fn encode(&self, geometry: &BucketGeometry) -> Result<Vec<u8>> {
        let capacity = geometry.records_per_bucket();
        if self.records.len() > capacity {
            return Err(RecError::Corruption(format!(
                "bucket holds {} records, capacity {}",
                self.records.len(),
                capacity
            )));
        }

        let mut buf = vec![0u8; geometry.bucket_size()];
        for (slot, record) in self.records.iter().enumerate() {
            record::encode_into(record, &mut buf[slot * RECORD_SIZE..])?;
        }

        let mut tail = &mut buf[capacity * RECORD_SIZE..];
        tail.put_i32_le(self.records.len() as i32);
        Ok(buf)
    }

    /// Decode a block read from disk, validating the occupancy field.
    pub(crate) fn decode(buf: &[u8], geometry: &BucketGeometry) -> Result<Self> {
        if buf.len() < geometry.bucket_size() {
            return Err(RecError::Corruption(format!(
                "bucket block is {} bytes, expected {}",
                buf.len(),
                geometry.bucket_size()
            )));
        }

        let capacity = geometry.records_per_bucket();
        let mut tail = &buf[capacity * RECORD_SIZE..];
        let occupancy = tail.get_i32_le();
        if occupancy < 0 || occupancy as usize > capacity {
            return Err(RecError::Corruption(format!(
                "bucket occupancy {} outside 0..={}",
                occupancy, capacity
            )));
        }

        let records = (0..occupancy as usize)
            .map(|slot| record::decode(&buf[slot * RECORD_SIZE..]))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { records })
    }
}
