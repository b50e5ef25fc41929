//! Storage Registry
//!
//! Maps each source file name to its ordered partitions.
//!
//! ## Lifecycle
//! 1. **Build**: every source file is ingested in parallel. Workers insert
//!    their finished partition lists into a mutex-guarded map; the first
//!    error is kept and returned once all workers have finished.
//! 2. **Serve**: the finished registry is read-only. Share it behind an
//!    `Arc`; lookups need no locking.
//!
//! A failed build never yields a registry, so a partially ingested source
//! set can't reach query traffic.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Result, ShardError};
use crate::ingest::Ingestor;
use crate::partition::MappedPartition;

/// Read-only index of ingested source files
#[derive(Debug)]
pub struct StorageRegistry {
    /// Source file name → partitions in ingestion (chronological) order
    partitions_by_file: HashMap<String, Vec<MappedPartition>>,

    /// Directory holding every partition file
    partition_dir: PathBuf,
}

impl StorageRegistry {
    /// Build from `config.source_dir` into `config.partition_dir`
    pub fn build(config: &Config) -> Result<Self> {
        config.validate()?;
        let ingestor = Ingestor::from_config(config)?;
        Self::build_with(&config.source_dir, &ingestor, config.ingest_workers)
    }

    /// Build with one worker per source file
    pub fn build_from(source_dir: &Path, capacity: usize, out_dir: &Path) -> Result<Self> {
        let ingestor = Ingestor::new(capacity, out_dir)?;
        Self::build_with(source_dir, &ingestor, 0)
    }

    /// Ingest every file in `source_dir` using at most `workers` threads
    /// (0 = one per file).
    ///
    /// Fails fast if the directory can't be listed. Otherwise blocks until
    /// every worker is done and returns the first ingestion error, if any.
    pub fn build_with(source_dir: &Path, ingestor: &Ingestor, workers: usize) -> Result<Self> {
        fs::create_dir_all(ingestor.out_dir())?;

        let sources = list_sources(source_dir)?;
        let worker_count = match workers {
            0 => sources.len(),
            n => n.min(sources.len()),
        };

        tracing::info!(
            source_dir = %source_dir.display(),
            files = sources.len(),
            workers = worker_count,
            capacity = ingestor.capacity(),
            "Building storage registry"
        );

        let (tx, rx) = crossbeam::channel::unbounded::<PathBuf>();
        for path in sources.iter().cloned() {
            tx.send(path)
                .map_err(|e| ShardError::Ingestion(format!("Failed to queue source: {}", e)))?;
        }
        drop(tx);

        let partitions_by_file = Mutex::new(HashMap::with_capacity(sources.len()));
        let first_error: Mutex<Option<ShardError>> = Mutex::new(None);

        let scope_result = crossbeam::scope(|scope| {
            for _ in 0..worker_count {
                let rx = rx.clone();
                let partitions_by_file = &partitions_by_file;
                let first_error = &first_error;

                scope.spawn(move |_| {
                    for path in rx.iter() {
                        // Queued files are skipped once the build has failed
                        if first_error.lock().is_some() {
                            continue;
                        }

                        match ingestor.process_file(&path) {
                            Ok(partitions) => {
                                let name = source_name(&path).unwrap_or_default();
                                partitions_by_file.lock().insert(name, partitions);
                            }
                            Err(e) => {
                                tracing::error!(
                                    source = %path.display(),
                                    error = %e,
                                    "Ingestion failed"
                                );
                                first_error.lock().get_or_insert(e);
                            }
                        }
                    }
                });
            }
        });

        if scope_result.is_err() {
            return Err(ShardError::Ingestion(
                "An ingestion worker panicked".to_string(),
            ));
        }
        if let Some(e) = first_error.into_inner() {
            return Err(e);
        }

        let registry = Self {
            partitions_by_file: partitions_by_file.into_inner(),
            partition_dir: ingestor.out_dir().to_path_buf(),
        };
        tracing::info!(
            files = registry.file_count(),
            partitions = registry.partition_count(),
            "Storage registry ready"
        );
        Ok(registry)
    }

    /// Partitions of `file_name` in chronological order, or None if it was
    /// never ingested
    pub fn get(&self, file_name: &str) -> Option<&[MappedPartition]> {
        self.partitions_by_file.get(file_name).map(Vec::as_slice)
    }

    /// Like [`get`](Self::get), reporting an unknown name as `FileNotFound`
    pub fn lookup(&self, file_name: &str) -> Result<&[MappedPartition]> {
        self.get(file_name)
            .ok_or_else(|| ShardError::FileNotFound(file_name.to_string()))
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.partitions_by_file.contains_key(file_name)
    }

    /// Ingested source file names, sorted
    pub fn file_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.partitions_by_file.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn file_count(&self) -> usize {
        self.partitions_by_file.len()
    }

    /// Total number of partitions across all files
    pub fn partition_count(&self) -> usize {
        self.partitions_by_file.values().map(Vec::len).sum()
    }

    pub fn partition_dir(&self) -> &Path {
        &self.partition_dir
    }
}

/// Delete a partition directory and everything in it. A missing directory is fine.
pub fn remove_partition_dir(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Regular files in `dir` with UTF-8 names, sorted by path
fn list_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "Skipping non-file entry");
            continue;
        }
        // Names key the registry and prefix partition files, so they must be exact
        if source_name(&path).is_none() {
            tracing::warn!(path = %path.display(), "Skipping source with a non-UTF-8 name");
            continue;
        }
        sources.push(path);
    }
    sources.sort();
    Ok(sources)
}

pub(crate) fn source_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}
