//! Response encoding
//!
//! A reply is one line: either the JSON array of records, or an error
//! object. Records are streamed through [`JsonArrayWriter`], which buffers a
//! whole partition before committing it, so a reply cut short by a failure
//! never ends mid-record.

use std::io::Write;

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShardError};
use crate::record::{ApiRecord, InternalRecord};

/// Error categories on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Unavailable,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

/// `{"error": {"kind": ..., "message": ...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

impl ErrorResponse {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn from_error(error: &ShardError) -> Self {
        let kind = match error {
            ShardError::BadRequest(_) => ErrorKind::BadRequest,
            ShardError::FileNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Internal,
        };
        Self::new(kind, error.to_string())
    }
}

/// A server reply as seen by a client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Records(Vec<ApiRecord>),
    Error(ErrorResponse),
}

impl Reply {
    /// Parse one reply line. A truncated reply is a protocol error.
    pub fn parse(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim_end())
            .map_err(|e| ShardError::Protocol(format!("Malformed reply: {}", e)))
    }
}

/// Write `response` as one line
pub fn write_error_response<W: Write>(writer: &mut W, response: &ErrorResponse) -> Result<()> {
    serde_json::to_writer(&mut *writer, response)
        .map_err(|e| ShardError::Encode(format!("Failed to encode error response: {}", e)))?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Streams a JSON array one batch at a time.
///
/// Nothing reaches the underlying writer until the first batch is complete,
/// so a failure before that can still be answered with an error object.
pub struct JsonArrayWriter<'w, W> {
    writer: &'w mut W,
    buf: BytesMut,
    opened: bool,
    records: usize,
}

impl<'w, W: Write> JsonArrayWriter<'w, W> {
    pub fn new(writer: &'w mut W) -> Self {
        Self {
            writer,
            buf: BytesMut::with_capacity(8 * 1024),
            opened: false,
            records: 0,
        }
    }

    /// Encode `records` into the buffer, then commit it to the writer
    pub fn write_batch(&mut self, records: &[InternalRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        self.buf.clear();
        self.buf.put_u8(if self.opened { b',' } else { b'[' });
        for (i, record) in records.iter().enumerate() {
            if i != 0 {
                self.buf.put_u8(b',');
            }
            serde_json::to_writer((&mut self.buf).writer(), &record.to_api())
                .map_err(|e| ShardError::Encode(format!("Failed to encode record: {}", e)))?;
        }

        self.writer.write_all(&self.buf)?;
        self.opened = true;
        self.records += records.len();
        Ok(())
    }

    /// True once any byte of the array has been written
    pub fn is_committed(&self) -> bool {
        self.opened
    }

    /// Records written so far
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Close the array (writing `[]` if no batch was written)
    pub fn finish(self) -> Result<usize> {
        if !self.opened {
            self.writer.write_all(b"[")?;
        }
        self.writer.write_all(b"]")?;
        Ok(self.records)
    }

    /// Give the writer back without closing the array
    pub fn into_inner(self) -> &'w mut W {
        self.writer
    }
}
