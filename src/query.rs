//! Range Query Engine
//!
//! Two-level binary search over a file's partitions:
//!
//! 1. **Across partitions**: `lo` is the first partition whose
//!    `max_timestamp >= start`, `hi` the first whose `min_timestamp > end`.
//! 2. **Within a partition**: [`Partition::select_records`] narrows the
//!    decoded records to `[start, end]`.
//!
//! Partitions in `[lo, hi)` are visited in index order. Each partition's
//! output is sorted and partitions don't overlap, so concatenating them is
//! already globally sorted; there is no merge step.
//!
//! Both levels assume sorted input and do not verify it.

use std::ops::Range;

use crate::error::Result;
use crate::partition::Partition;
use crate::record::InternalRecord;

/// Indices of the partitions that may hold records in `[start, end]`
pub fn partition_window<P: Partition>(partitions: &[P], start: i64, end: i64) -> Range<usize> {
    let lo = partitions.partition_point(|p| p.max_timestamp() < start);
    let hi = partitions.partition_point(|p| p.min_timestamp() <= end);
    lo..hi.max(lo)
}

/// Stream the records in `[start, end]`, one partition at a time
pub fn select<P: Partition>(partitions: &[P], start: i64, end: i64) -> RangeScan<'_, P> {
    let window = partition_window(partitions, start, end);
    RangeScan {
        partitions: &partitions[window],
        start,
        end,
        next: 0,
        failed: false,
    }
}

/// Collect every record in `[start, end]`, stopping at the first error
pub fn select_all<P: Partition>(partitions: &[P], start: i64, end: i64) -> Result<Vec<InternalRecord>> {
    let mut records = Vec::new();
    for batch in select(partitions, start, end) {
        records.extend(batch?);
    }
    Ok(records)
}

/// Iterator over the per-partition results of a range query.
///
/// Yields one non-empty, sorted batch per partition in ascending order.
/// After an error the scan ends.
#[derive(Debug)]
pub struct RangeScan<'a, P> {
    /// Partitions inside the window, in order
    partitions: &'a [P],
    start: i64,
    end: i64,
    next: usize,
    failed: bool,
}

impl<'a, P: Partition> RangeScan<'a, P> {
    /// Number of partitions the scan will visit in total
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }
}

impl<'a, P: Partition> Iterator for RangeScan<'a, P> {
    type Item = Result<Vec<InternalRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        while let Some(partition) = self.partitions.get(self.next) {
            self.next += 1;
            match partition.select_records(self.start, self.end) {
                Ok(records) if records.is_empty() => continue,
                Ok(records) => return Some(Ok(records)),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
