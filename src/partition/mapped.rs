//! Memory-mapped partition
//!
//! Holds the read-only map of a data file plus its decoded meta. The map is
//! released only when the partition is dropped, which for partitions held
//! by the registry means process exit.

use memmap2::Mmap;

use crate::codec;
use crate::error::Result;
use crate::record::InternalRecord;

use super::{sorted_window, Partition, PartitionFiles, PartitionMeta};

/// A set-up partition, ready for queries
#[derive(Debug)]
pub struct MappedPartition {
    files: PartitionFiles,
    meta: PartitionMeta,
    map: Mmap,
}

impl MappedPartition {
    pub(super) fn new(files: PartitionFiles, meta: PartitionMeta, map: Mmap) -> Self {
        Self { files, meta, map }
    }

    /// Decoded meta file
    pub fn meta(&self) -> &PartitionMeta {
        &self.meta
    }

    /// Paths backing this partition
    pub fn files(&self) -> &PartitionFiles {
        &self.files
    }

    /// Number of records according to the meta file
    pub fn len(&self) -> usize {
        self.meta.size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.meta.size == 0
    }

    /// Size of the mapped data region in bytes
    pub fn mapped_len(&self) -> usize {
        self.map.len()
    }

    /// Decode every record in the mapped region
    pub fn decode_all(&self) -> Result<Vec<InternalRecord>> {
        codec::decode_records(&self.map)
    }
}

impl Partition for MappedPartition {
    fn min_timestamp(&self) -> i64 {
        self.meta.min_timestamp
    }

    fn max_timestamp(&self) -> i64 {
        self.meta.max_timestamp
    }

    /// Returns records that are >= start and <= end, sorted by timestamp.
    ///
    /// Ranges entirely outside [min, max] return early without decoding.
    fn select_records(&self, start: i64, end: i64) -> Result<Vec<InternalRecord>> {
        if end < self.meta.min_timestamp || start > self.meta.max_timestamp {
            return Ok(Vec::new());
        }

        let mut records = self.decode_all()?;
        let window = sorted_window(&records, start, end);
        records.truncate(window.end);
        records.drain(..window.start);
        Ok(records)
    }
}
