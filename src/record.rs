//! Record Model
//!
//! The two record shapes and the conversion between them.
//!
//! - [`InternalRecord`] is the unit of storage, bincode-encoded on disk and
//!   ordered by its unix-second `timestamp`.
//! - [`ApiRecord`] is the JSON projection handed to clients, with the
//!   timestamp rendered as RFC3339 UTC text.
//!
//! ## Source Line Format
//! ```text
//! <RFC3339 timestamp> <identity> <session_id>
//! 2001-07-08T19:29:30Z dominique@schuster.com 2b457fa5-4453-475d-b9d1-f737e02ed732
//! ```

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored event, ordered by `timestamp`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalRecord {
    /// Who produced the event (an email address in the sample data)
    pub identity: String,

    /// Session the event belongs to
    pub session_id: String,

    /// Event time in unix seconds
    pub timestamp: i64,
}

/// Client-facing projection of an [`InternalRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRecord {
    #[serde(rename = "email")]
    pub identity: String,

    #[serde(rename = "sessionId")]
    pub session_id: String,

    #[serde(rename = "eventTime")]
    pub event_time: String,
}

/// Why a source line could not be turned into a record
#[derive(Debug, Error)]
pub enum ParseRecordError {
    #[error("expected 3 tokens, got {0}")]
    TokenCount(usize),

    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("line is not valid UTF-8")]
    Encoding,
}

impl InternalRecord {
    pub fn new(identity: impl Into<String>, session_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            identity: identity.into(),
            session_id: session_id.into(),
            timestamp,
        }
    }

    /// Parse a `<timestamp> <identity> <session_id>` line
    pub fn parse_line(line: &str) -> Result<Self, ParseRecordError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 3 {
            return Err(ParseRecordError::TokenCount(tokens.len()));
        }

        Ok(Self {
            timestamp: parse_rfc3339(tokens[0])?,
            identity: tokens[1].to_string(),
            session_id: tokens[2].to_string(),
        })
    }

    /// Parse a raw line as read from the source stream
    pub fn parse_bytes(line: &[u8]) -> Result<Self, ParseRecordError> {
        let line = std::str::from_utf8(line).map_err(|_| ParseRecordError::Encoding)?;
        Self::parse_line(line)
    }

    /// Project into the client-facing shape
    pub fn to_api(&self) -> ApiRecord {
        ApiRecord {
            identity: self.identity.clone(),
            session_id: self.session_id.clone(),
            event_time: format_rfc3339(self.timestamp),
        }
    }
}

impl FromStr for InternalRecord {
    type Err = ParseRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_line(s)
    }
}

impl From<&InternalRecord> for ApiRecord {
    fn from(record: &InternalRecord) -> Self {
        record.to_api()
    }
}

impl From<InternalRecord> for ApiRecord {
    fn from(record: InternalRecord) -> Self {
        ApiRecord {
            event_time: format_rfc3339(record.timestamp),
            identity: record.identity,
            session_id: record.session_id,
        }
    }
}

/// Parse RFC3339 text into unix seconds (sub-second precision is dropped)
pub fn parse_rfc3339(text: &str) -> Result<i64, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|t| t.timestamp())
}

/// Format unix seconds as RFC3339 UTC text, e.g. `2001-07-08T19:29:30Z`
pub fn format_rfc3339(timestamp: i64) -> String {
    // Only timestamps outside chrono's year range fall through; parsed input never does.
    DateTime::from_timestamp(timestamp, 0)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| timestamp.to_string())
}
