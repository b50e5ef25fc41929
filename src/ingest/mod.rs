//! Ingestion Pipeline
//!
//! Splits a line stream into bounded partitions, persists each one and
//! hands back the mapped partition handles.
//!
//! ## Responsibilities
//! - Parse `<timestamp> <identity> <session_id>` lines, dropping malformed ones
//! - Cut chunks of at most `capacity` parsed records
//! - Write `{source}-data-{index}` / `{source}-meta-{index}` per chunk
//! - Set up every written partition before returning it
//!
//! ## Failure Model
//! A malformed line is logged and skipped. Read, encode and write errors
//! abort the whole call. Each file is written to a `.tmp` sibling and
//! renamed into place, so a failed chunk leaves no partial files behind;
//! chunks written before the failure are kept.

mod scanner;

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::codec;
use crate::config::{Config, DEFAULT_PARTITION_CAPACITY};
use crate::error::{Result, ShardError};
use crate::partition::{MappedPartition, PartitionFiles, PartitionMeta};
use crate::record::InternalRecord;

pub use scanner::LineScanner;

/// Chunks source streams into partitions under one output directory
#[derive(Debug, Clone)]
pub struct Ingestor {
    /// Maximum parsed records per partition
    capacity: usize,
    /// Directory receiving partition files
    out_dir: PathBuf,
    /// Reject out-of-order input instead of reporting it
    strict_ordering: bool,
}

/// Per-stream counters, reported once the stream is exhausted
#[derive(Debug, Default)]
struct IngestStats {
    records: u64,
    dropped_lines: u64,
    out_of_order: u64,
    previous: Option<i64>,
}

impl Ingestor {
    /// Create an ingestor writing partitions of `capacity` records into `out_dir`
    pub fn new(capacity: usize, out_dir: impl Into<PathBuf>) -> Result<Self> {
        if capacity == 0 {
            return Err(ShardError::Config(
                "partition capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            capacity,
            out_dir: out_dir.into(),
            strict_ordering: false,
        })
    }

    /// Build from the partition settings of a config
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.partition_capacity, &config.partition_dir)?
            .strict_ordering(config.strict_ordering))
    }

    /// Fail on the first record whose timestamp is lower than its predecessor's
    pub fn strict_ordering(mut self, strict: bool) -> Self {
        self.strict_ordering = strict;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Ingest a source file, naming its partitions after the file name
    pub fn process_file(&self, path: &Path) -> Result<Vec<MappedPartition>> {
        let source_name = crate::registry::source_name(path).ok_or_else(|| {
            ShardError::Ingestion(format!("{} has no UTF-8 file name", path.display()))
        })?;
        let file = File::open(path)?;
        self.process(BufReader::new(file), &source_name)
    }

    /// Split `reader` into partitions prefixed with `source_name`.
    ///
    /// Returns the set-up partitions in ingestion order. No trailing empty
    /// partition is ever written.
    pub fn process<R: BufRead>(&self, reader: R, source_name: &str) -> Result<Vec<MappedPartition>> {
        let mut scanner = LineScanner::new(reader);
        let mut stats = IngestStats::default();
        let mut partitions = Vec::new();

        loop {
            let records = self.scan_chunk(&mut scanner, source_name, &mut stats)?;
            let Some(meta) = PartitionMeta::from_chunk(&records) else {
                break;
            };

            let files = self.write_partition(source_name, partitions.len(), &records, &meta)?;
            partitions.push(files.setup()?);
        }

        if stats.out_of_order > 0 {
            tracing::warn!(
                source = source_name,
                out_of_order = stats.out_of_order,
                "Input is not sorted by timestamp; range queries over it may be incorrect"
            );
        }
        tracing::info!(
            source = source_name,
            lines = scanner.line_number(),
            records = stats.records,
            dropped = stats.dropped_lines,
            partitions = partitions.len(),
            "Ingested source"
        );

        Ok(partitions)
    }

    /// Collect up to `capacity` parsed records. Malformed lines don't count.
    fn scan_chunk<R: BufRead>(
        &self,
        scanner: &mut LineScanner<R>,
        source_name: &str,
        stats: &mut IngestStats,
    ) -> Result<Vec<InternalRecord>> {
        let mut records = Vec::with_capacity(self.capacity.min(DEFAULT_PARTITION_CAPACITY));

        while records.len() < self.capacity {
            let Some((line_number, line)) = scanner.next_line()? else {
                break;
            };

            let record = match InternalRecord::parse_bytes(line) {
                Ok(record) => record,
                Err(e) => {
                    stats.dropped_lines += 1;
                    tracing::warn!(
                        source = source_name,
                        line = line_number,
                        error = %e,
                        "Dropping malformed record"
                    );
                    continue;
                }
            };

            if let Some(previous) = stats.previous {
                if record.timestamp < previous {
                    if self.strict_ordering {
                        return Err(ShardError::UnsortedInput {
                            source_name: source_name.to_string(),
                            line: line_number,
                            timestamp: record.timestamp,
                            previous,
                        });
                    }
                    stats.out_of_order += 1;
                }
            }
            stats.previous = Some(record.timestamp);
            stats.records += 1;
            records.push(record);
        }

        Ok(records)
    }

    /// Persist one chunk as a data/meta pair
    fn write_partition(
        &self,
        source_name: &str,
        index: usize,
        records: &[InternalRecord],
        meta: &PartitionMeta,
    ) -> Result<PartitionFiles> {
        let files = PartitionFiles::for_chunk(&self.out_dir, source_name, index);

        // Encode both up front so an encode failure writes nothing
        let data = codec::encode_records(records)?;
        let meta_bytes = codec::encode_meta(meta)?;

        write_file(&files.data_path, &data)?;
        if let Err(e) = write_file(&files.meta_path, &meta_bytes) {
            let _ = fs::remove_file(&files.data_path);
            return Err(e);
        }

        tracing::debug!(
            source = source_name,
            index,
            records = meta.size,
            min = meta.min_timestamp,
            max = meta.max_timestamp,
            "Partition written"
        );
        Ok(files)
    }
}

/// Write via a `.tmp` sibling + rename so `path` is either complete or absent
fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let result = File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|_| fs::rename(&tmp, path));

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
