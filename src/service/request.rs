//! Select request
//!
//! `{"filename": "...", "from": "<RFC3339>", "to": "<RFC3339>"}`

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShardError};
use crate::record::parse_rfc3339;

/// A closed-interval range query against one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectRequest {
    #[serde(rename = "filename", alias = "Filename", alias = "file_name", alias = "fileName")]
    pub file_name: String,

    #[serde(alias = "From")]
    pub from: String,

    #[serde(alias = "To")]
    pub to: String,
}

/// Parsed bounds of a request, in unix seconds, both inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl SelectRequest {
    pub fn new(file_name: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// Parse one JSON request
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| ShardError::BadRequest(format!("error decoding request body, {}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ShardError::Encode(format!("Failed to encode request: {}", e)))
    }

    /// Parse `from`/`to`. Rejects unparsable timestamps and `from > to`.
    pub fn time_range(&self) -> Result<TimeRange> {
        let start = parse_rfc3339(&self.from)
            .map_err(|e| ShardError::BadRequest(format!("invalid from timestamp {:?}: {}", self.from, e)))?;
        let end = parse_rfc3339(&self.to)
            .map_err(|e| ShardError::BadRequest(format!("invalid to timestamp {:?}: {}", self.to, e)))?;

        if start > end {
            return Err(ShardError::BadRequest(format!(
                "from ({}) is after to ({})",
                self.from, self.to
            )));
        }
        Ok(TimeRange { start, end })
    }
}
