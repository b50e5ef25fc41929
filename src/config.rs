//! Configuration for timeshard
//!
//! Centralized configuration with sensible defaults. Everything here is
//! supplied once at startup and stays fixed for the process lifetime.

use std::path::PathBuf;

use crate::error::{Result, ShardError};

/// Default number of records per partition
pub const DEFAULT_PARTITION_CAPACITY: usize = 4096;

/// Main configuration for a timeshard instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the raw line-oriented event logs.
    /// Every entry becomes one registry key (its file name).
    pub source_dir: PathBuf,

    /// Directory where partition files are written:
    ///   {partition_dir}/
    ///     ├── {source}-data-{index}
    ///     └── {source}-meta-{index}
    pub partition_dir: PathBuf,

    /// Maximum number of records per partition
    pub partition_capacity: usize,

    // -------------------------------------------------------------------------
    // Ingestion Configuration
    // -------------------------------------------------------------------------
    /// Size of the ingestion worker pool (0 = one worker per source file)
    pub ingest_workers: usize,

    /// Fail ingestion on the first record whose timestamp goes backwards
    /// instead of only reporting it
    pub strict_ordering: bool,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("./test-files"),
            partition_dir: PathBuf::from("./partitions"),
            partition_capacity: DEFAULT_PARTITION_CAPACITY,
            ingest_workers: 0,
            strict_ordering: false,
            listen_addr: "127.0.0.1:8279".to_string(),
            max_connections: 1024,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.partition_capacity == 0 {
            return Err(ShardError::Config(
                "partition capacity must be at least 1".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ShardError::Config(
                "max connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the directory containing the source event logs
    pub fn source_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.source_dir = path.into();
        self
    }

    /// Set the directory partitions are written to
    pub fn partition_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.partition_dir = path.into();
        self
    }

    /// Set the number of records per partition
    pub fn partition_capacity(mut self, capacity: usize) -> Self {
        self.config.partition_capacity = capacity;
        self
    }

    /// Set the ingestion worker count (0 = one per source file)
    pub fn ingest_workers(mut self, workers: usize) -> Self {
        self.config.ingest_workers = workers;
        self
    }

    /// Fail ingestion on out-of-order input
    pub fn strict_ordering(mut self, strict: bool) -> Self {
        self.config.strict_ordering = strict;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
