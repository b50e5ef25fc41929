//! Error types for timeshard
//!
//! Provides a unified error type for ingestion, partition access and queries.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using ShardError
pub type Result<T> = std::result::Result<T, ShardError>;

/// Unified error type for timeshard operations
#[derive(Debug, Error)]
pub enum ShardError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Partition Errors
    // -------------------------------------------------------------------------
    #[error("Empty partition file: {}", .0.display())]
    EmptyPartition(PathBuf),

    #[error("Failed to map partition file {}: {source}", path.display())]
    Mapping {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Ingestion Errors
    // -------------------------------------------------------------------------
    #[error(
        "Unsorted input in {source_name} at line {line}: timestamp {timestamp} precedes {previous}"
    )]
    UnsortedInput {
        source_name: String,
        line: u64,
        timestamp: i64,
        previous: i64,
    },

    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    // -------------------------------------------------------------------------
    // Query Errors
    // -------------------------------------------------------------------------
    #[error("File {0} is not found")]
    FileNotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ShardError {
    /// True for errors caused by the caller's input rather than by the server
    pub fn is_client_error(&self) -> bool {
        matches!(self, ShardError::BadRequest(_) | ShardError::FileNotFound(_))
    }
}
