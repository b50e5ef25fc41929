//! Tests for the range query engine
//!
//! These tests verify:
//! - Partition window selection (first level of the search)
//! - Per-partition narrowing and ordered concatenation
//! - Partitions outside the range are never asked for records
//! - Error handling of a streaming scan

use std::cell::Cell;
use std::io::Cursor;

use proptest::prelude::*;
use tempfile::TempDir;
use timeshard::ingest::Ingestor;
use timeshard::partition::select_sorted;
use timeshard::query::{self, partition_window};
use timeshard::{InternalRecord, Partition, Result, ShardError};

// =============================================================================
// Mock Partition
// =============================================================================

#[derive(Debug)]
struct MockPartition {
    records: Vec<InternalRecord>,
    fail: bool,
    calls: Cell<usize>,
}

impl MockPartition {
    fn new(timestamps: &[i64]) -> Self {
        Self {
            records: timestamps
                .iter()
                .map(|&ts| InternalRecord::new("a@b.com", format!("s{}", ts), ts))
                .collect(),
            fail: false,
            calls: Cell::new(0),
        }
    }

    fn failing(timestamps: &[i64]) -> Self {
        Self {
            fail: true,
            ..Self::new(timestamps)
        }
    }

    fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Partition for MockPartition {
    fn min_timestamp(&self) -> i64 {
        self.records[0].timestamp
    }

    fn max_timestamp(&self) -> i64 {
        self.records[self.records.len() - 1].timestamp
    }

    fn select_records(&self, start: i64, end: i64) -> Result<Vec<InternalRecord>> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(ShardError::Decode("corrupt partition".to_string()));
        }
        Ok(select_sorted(&self.records, start, end).to_vec())
    }
}

fn two_partitions() -> Vec<MockPartition> {
    vec![
        MockPartition::new(&[10, 20, 30, 40, 50]),
        MockPartition::new(&[60, 70, 80, 90, 100]),
    ]
}

fn timestamps(records: &[InternalRecord]) -> Vec<i64> {
    records.iter().map(|r| r.timestamp).collect()
}

// =============================================================================
// Partition Window Tests
// =============================================================================

#[test]
fn test_window_spanning_partitions() {
    let partitions = two_partitions();

    assert_eq!(partition_window(&partitions, 20, 70), 0..2);
    assert_eq!(partition_window(&partitions, 0, 1000), 0..2);
}

#[test]
fn test_window_single_partition() {
    let partitions = two_partitions();

    assert_eq!(partition_window(&partitions, 20, 40), 0..1);
    assert_eq!(partition_window(&partitions, 65, 95), 1..2);
}

#[test]
fn test_window_gap_between_partitions() {
    let partitions = two_partitions();

    assert!(partition_window(&partitions, 51, 59).is_empty());
}

#[test]
fn test_window_out_of_range() {
    let partitions = two_partitions();

    assert!(partition_window(&partitions, 0, 5).is_empty());
    assert!(partition_window(&partitions, 200, 300).is_empty());
    assert!(partition_window(&partitions, 70, 20).is_empty());
}

#[test]
fn test_window_no_partitions() {
    let partitions: Vec<MockPartition> = Vec::new();

    assert!(partition_window(&partitions, 0, 100).is_empty());
}

// =============================================================================
// Selection Tests
// =============================================================================

#[test]
fn test_select_across_partitions() {
    let partitions = two_partitions();

    let records = query::select_all(&partitions, 20, 70).unwrap();

    assert_eq!(timestamps(&records), vec![20, 30, 40, 50, 60, 70]);
}

#[test]
fn test_select_boundary_records_included() {
    let partitions = two_partitions();

    let records = query::select_all(&partitions, 50, 60).unwrap();

    assert_eq!(timestamps(&records), vec![50, 60]);
}

#[test]
fn test_select_below_range_touches_nothing() {
    let partitions = two_partitions();

    let records = query::select_all(&partitions, 0, 5).unwrap();

    assert!(records.is_empty());
    assert!(partitions.iter().all(|p| p.calls() == 0));
}

#[test]
fn test_select_above_range_touches_nothing() {
    let partitions = two_partitions();

    let records = query::select_all(&partitions, 200, 300).unwrap();

    assert!(records.is_empty());
    assert!(partitions.iter().all(|p| p.calls() == 0));
}

#[test]
fn test_select_only_visits_window() {
    let partitions = vec![
        MockPartition::new(&[10, 20]),
        MockPartition::new(&[30, 40]),
        MockPartition::new(&[50, 60]),
        MockPartition::new(&[70, 80]),
    ];

    let records = query::select_all(&partitions, 35, 55).unwrap();

    assert_eq!(timestamps(&records), vec![40, 50]);
    let calls: Vec<usize> = partitions.iter().map(MockPartition::calls).collect();
    assert_eq!(calls, vec![0, 1, 1, 0]);
}

#[test]
fn test_inverted_range_is_empty() {
    let partitions = two_partitions();

    assert!(query::select_all(&partitions, 70, 20).unwrap().is_empty());
}

#[test]
fn test_equal_timestamps_across_boundary() {
    let partitions = vec![MockPartition::new(&[10, 20, 20]), MockPartition::new(&[20, 30])];

    let records = query::select_all(&partitions, 20, 20).unwrap();

    assert_eq!(timestamps(&records), vec![20, 20, 20]);
}

// =============================================================================
// Streaming Tests
// =============================================================================

#[test]
fn test_scan_yields_one_batch_per_partition() {
    let partitions = two_partitions();

    let scan = query::select(&partitions, 20, 70);
    assert_eq!(scan.partition_count(), 2);

    let batches: Vec<Vec<i64>> = scan.map(|b| timestamps(&b.unwrap())).collect();
    assert_eq!(batches, vec![vec![20, 30, 40, 50], vec![60, 70]]);
}

#[test]
fn test_scan_skips_empty_batches() {
    let partitions = vec![MockPartition::new(&[10, 50]), MockPartition::new(&[60, 100])];

    let batches: Vec<_> = query::select(&partitions, 20, 40).collect();

    assert!(batches.is_empty());
    assert_eq!(partitions[0].calls(), 1);
}

#[test]
fn test_scan_stops_after_error() {
    let partitions = vec![
        MockPartition::new(&[10, 20]),
        MockPartition::failing(&[30, 40]),
        MockPartition::new(&[50, 60]),
    ];

    let mut scan = query::select(&partitions, 0, 100);

    assert!(scan.next().unwrap().is_ok());
    assert!(matches!(scan.next(), Some(Err(ShardError::Decode(_)))));
    assert!(scan.next().is_none());
    assert_eq!(partitions[2].calls(), 0);
}

#[test]
fn test_select_all_propagates_error() {
    let partitions = vec![MockPartition::new(&[10, 20]), MockPartition::failing(&[30, 40])];

    assert!(query::select_all(&partitions, 0, 100).is_err());
}

// =============================================================================
// Mapped Partition Tests
// =============================================================================

#[test]
fn test_select_over_ingested_partitions() {
    let dir = TempDir::new().unwrap();
    let input: String = (0..25)
        .map(|i| format!("{} a@b.com s{}\n", timeshard::record::format_rfc3339(1_000 + i * 10), i))
        .collect();
    let partitions = Ingestor::new(4, dir.path())
        .unwrap()
        .process(Cursor::new(input.into_bytes()), "events.txt")
        .unwrap();

    let records = query::select_all(&partitions, 1_035, 1_125).unwrap();

    assert_eq!(
        timestamps(&records),
        vec![1_040, 1_050, 1_060, 1_070, 1_080, 1_090, 1_100, 1_110, 1_120]
    );
}

proptest! {
    #[test]
    fn test_concatenation_matches_filter(
        mut ts in prop::collection::vec(0i64..500, 1..80),
        chunk in 1usize..10,
        a in -10i64..510,
        b in -10i64..510,
    ) {
        ts.sort_unstable();
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        let partitions: Vec<MockPartition> = ts.chunks(chunk).map(MockPartition::new).collect();

        let selected = timestamps(&query::select_all(&partitions, start, end).unwrap());
        let expected: Vec<i64> = ts.iter().copied().filter(|t| *t >= start && *t <= end).collect();

        prop_assert_eq!(selected, expected);
    }
}
