//! Partition file naming and setup
//!
//! Names are deterministic: `{dir}/{source}-data-{index}` and
//! `{dir}/{source}-meta-{index}`, with `index` zero-based and contiguous
//! per source file.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::codec;
use crate::error::{Result, ShardError};

use super::MappedPartition;

/// File name component marking a data file
pub const DATA_FILE_NAME: &str = "data";

/// File name component marking a meta file
pub const META_FILE_NAME: &str = "meta";

/// Paths of one partition's data and meta files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionFiles {
    pub data_path: PathBuf,
    pub meta_path: PathBuf,
}

impl PartitionFiles {
    pub fn new(data_path: impl Into<PathBuf>, meta_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            meta_path: meta_path.into(),
        }
    }

    /// Paths for chunk `index` of `source_name` inside `dir`
    pub fn for_chunk(dir: &Path, source_name: &str, index: usize) -> Self {
        Self {
            data_path: dir.join(format!("{}-{}-{}", source_name, DATA_FILE_NAME, index)),
            meta_path: dir.join(format!("{}-{}-{}", source_name, META_FILE_NAME, index)),
        }
    }

    /// List the contiguous pairs `0..n` written for `source_name`.
    ///
    /// Stops at the first index with neither file present. A pair with only
    /// one of its two files is reported as an error.
    pub fn discover(dir: &Path, source_name: &str) -> Result<Vec<Self>> {
        let mut found = Vec::new();
        for index in 0.. {
            let files = Self::for_chunk(dir, source_name, index);
            match (files.data_path.is_file(), files.meta_path.is_file()) {
                (true, true) => found.push(files),
                (false, false) => break,
                (true, false) => return Err(missing(&files.meta_path)),
                (false, true) => return Err(missing(&files.data_path)),
            }
        }
        Ok(found)
    }

    /// Open, map and decode this pair.
    ///
    /// Fails on a zero-length data file, a mapping failure or an
    /// undecodable meta file. Consumes the paths so a pair is set up once.
    pub fn setup(self) -> Result<MappedPartition> {
        let file = File::open(&self.data_path)?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Err(ShardError::EmptyPartition(self.data_path));
        }

        // SAFETY: partition files are written once before being mapped and
        // are never modified afterwards; the map is read-only.
        let map = unsafe { Mmap::map(&file) }.map_err(|source| ShardError::Mapping {
            path: self.data_path.clone(),
            source,
        })?;

        let meta = codec::decode_meta(&fs::read(&self.meta_path)?)?;

        tracing::debug!(
            data = %self.data_path.display(),
            bytes = len,
            records = meta.size,
            "Partition mapped"
        );

        Ok(MappedPartition::new(self, meta, map))
    }
}

fn missing(path: &Path) -> ShardError {
    ShardError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("partition file {} is missing", path.display()),
    ))
}
