//! # timeshard
//!
//! Write-once time partitions for line-oriented event logs:
//! - Source files chunked into fixed-capacity partitions on disk
//! - Data files memory-mapped read-only, decoded on demand
//! - Two-level binary search for closed time-range queries
//! - Line-delimited JSON query protocol over TCP
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Source Directory                           │
//! │        (one event log per file, sorted by time)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  one worker per file
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Ingestion Pipeline                          │
//! │        (parse lines, cut chunks, write + map)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌───────────────┐
//!   │ Partition   │          │   Storage     │
//!   │ Files       │◄─mmap────│   Registry    │
//!   │ (data/meta) │          │ (frozen map)  │
//!   └─────────────┘          └──────┬────────┘
//!                                   │
//!                                   ▼
//!                           ┌───────────────┐
//!                           │ Range Query   │
//!                           │ Engine        │
//!                           └──────┬────────┘
//!                                  │
//!                                  ▼
//!                           ┌───────────────┐
//!                           │ Query Service │
//!                           │  / TCP Server │
//!                           └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod codec;
pub mod partition;
pub mod ingest;
pub mod registry;
pub mod query;
pub mod service;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, ShardError};
pub use config::Config;
pub use partition::{MappedPartition, Partition, PartitionFiles, PartitionMeta};
pub use record::{ApiRecord, InternalRecord};
pub use registry::StorageRegistry;
pub use service::QueryService;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of timeshard
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
