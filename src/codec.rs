//! Binary codec for partition files
//!
//! Both files of a partition are plain bincode (fixed-width, little-endian):
//!
//! ```text
//! data file:  [count: u64] then per record
//!             [len: u64][identity] [len: u64][session_id] [timestamp: i64]
//! meta file:  [min_timestamp: i64][max_timestamp: i64][size: u64]
//! ```
//!
//! Encoding and decoding are stateless, so a failed decode never affects
//! another partition or a later query.

use crate::error::{Result, ShardError};
use crate::partition::PartitionMeta;
use crate::record::InternalRecord;

/// Encode an ordered record sequence into data-file bytes
pub fn encode_records(records: &[InternalRecord]) -> Result<Vec<u8>> {
    bincode::serialize(records)
        .map_err(|e| ShardError::Encode(format!("Failed to encode records: {}", e)))
}

/// Decode data-file bytes into the ordered record sequence
pub fn decode_records(bytes: &[u8]) -> Result<Vec<InternalRecord>> {
    bincode::deserialize(bytes)
        .map_err(|e| ShardError::Decode(format!("Failed to decode data: {}", e)))
}

/// Encode partition metadata into meta-file bytes
pub fn encode_meta(meta: &PartitionMeta) -> Result<Vec<u8>> {
    bincode::serialize(meta)
        .map_err(|e| ShardError::Encode(format!("Failed to encode metadata: {}", e)))
}

/// Decode meta-file bytes
pub fn decode_meta(bytes: &[u8]) -> Result<PartitionMeta> {
    bincode::deserialize(bytes)
        .map_err(|e| ShardError::Decode(format!("Failed to decode metadata: {}", e)))
}
