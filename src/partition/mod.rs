//! Partition Module
//!
//! A partition is a bounded, immutable, memory-mapped run of records
//! from one source file.
//!
//! ## File Pair
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ {source}-data-{index}                                    │
//! │   bincode Vec<InternalRecord>, ascending by timestamp    │
//! │   (memory-mapped read-only, decoded per query)           │
//! ├──────────────────────────────────────────────────────────┤
//! │ {source}-meta-{index}                                    │
//! │   bincode { min_timestamp, max_timestamp, size }         │
//! │   (decoded once at setup)                                │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//! [`PartitionFiles`] names a pair on disk. Consuming it with
//! [`PartitionFiles::setup`] opens, maps and decodes it into a
//! [`MappedPartition`], which then lives until process exit.

mod files;
mod mapped;

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::record::InternalRecord;

pub use files::{PartitionFiles, DATA_FILE_NAME, META_FILE_NAME};
pub use mapped::MappedPartition;

/// Decoded contents of a meta file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionMeta {
    /// Timestamp of the first record in ingestion order
    pub min_timestamp: i64,
    /// Timestamp of the last record in ingestion order
    pub max_timestamp: i64,
    /// Number of records in the partition
    pub size: u64,
}

impl PartitionMeta {
    /// Describe a chunk by its first and last record (no re-sort).
    /// Returns None for an empty chunk.
    pub fn from_chunk(records: &[InternalRecord]) -> Option<Self> {
        let first = records.first()?;
        let last = records.last()?;
        Some(Self {
            min_timestamp: first.timestamp,
            max_timestamp: last.timestamp,
            size: records.len() as u64,
        })
    }
}

/// Read access to one time-bounded partition.
///
/// The query engine is generic over this trait; [`MappedPartition`] is the
/// on-disk implementation.
pub trait Partition {
    /// Timestamp of the first stored record
    fn min_timestamp(&self) -> i64;

    /// Timestamp of the last stored record
    fn max_timestamp(&self) -> i64;

    /// Records with `start <= timestamp <= end`, in stored order
    fn select_records(&self, start: i64, end: i64) -> Result<Vec<InternalRecord>>;
}

/// Closed-interval binary search over records sorted by timestamp
pub fn select_sorted(records: &[InternalRecord], start: i64, end: i64) -> &[InternalRecord] {
    &records[sorted_window(records, start, end)]
}

/// Index range of records with `start <= timestamp <= end`.
/// lo = first timestamp >= start, hi = first timestamp > end.
pub(crate) fn sorted_window(records: &[InternalRecord], start: i64, end: i64) -> Range<usize> {
    let lo = records.partition_point(|r| r.timestamp < start);
    let hi = records.partition_point(|r| r.timestamp <= end);
    lo..hi.max(lo)
}
