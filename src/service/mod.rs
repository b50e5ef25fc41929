//! Query Service
//!
//! The request/response contract between clients and the query engine,
//! independent of the transport.
//!
//! ## Exchange
//! ```text
//! request:   {"filename":"sample1.txt","from":"2001-07-08T00:00:00Z","to":"2001-07-09T00:00:00Z"}
//! success:   [{"email":"...","sessionId":"...","eventTime":"2001-07-08T19:29:30Z"}, ...]
//! failure:   {"error":{"kind":"not_found","message":"File nope.txt is not found"}}
//! ```
//!
//! Bad JSON, bad timestamps, an inverted range and unknown files are all
//! answered with an error object, never with an empty array. An empty
//! array means the file exists but holds nothing in range.
//!
//! If a partition fails to decode after earlier partitions were already
//! written, the error is returned to the transport instead, which ends the
//! connection. The client then sees a truncated reply.

mod request;
mod response;

use std::io::Write;
use std::sync::Arc;

use crate::error::{Result, ShardError};
use crate::partition::{MappedPartition, Partition};
use crate::query;
use crate::record::ApiRecord;
use crate::registry::StorageRegistry;

pub use request::{SelectRequest, TimeRange};
pub use response::{
    write_error_response, ErrorBody, ErrorKind, ErrorResponse, JsonArrayWriter, Reply,
};

/// Answers select requests against a built registry
#[derive(Debug, Clone)]
pub struct QueryService {
    registry: Arc<StorageRegistry>,
}

impl QueryService {
    /// The registry must be fully built before it is handed over
    pub fn new(registry: Arc<StorageRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &StorageRegistry {
        &self.registry
    }

    /// Validate `request` and find the partitions it targets
    pub fn resolve(&self, request: &SelectRequest) -> Result<(TimeRange, &[MappedPartition])> {
        let range = request.time_range()?;
        let partitions = self.registry.lookup(&request.file_name)?;
        Ok((range, partitions))
    }

    /// Run `request` and collect the projected records
    pub fn select(&self, request: &SelectRequest) -> Result<Vec<ApiRecord>> {
        let (range, partitions) = self.resolve(request)?;
        let records = query::select_all(partitions, range.start, range.end)?;
        Ok(records.into_iter().map(ApiRecord::from).collect())
    }

    /// Run `request` and stream the JSON array into `writer`
    pub fn stream_select<W: Write>(&self, request: &SelectRequest, writer: &mut W) -> Result<usize> {
        let (range, partitions) = self.resolve(request)?;
        write_records(partitions, range.start, range.end, writer)
    }

    /// Answer one request line, writing exactly one reply line.
    ///
    /// Returns Ok once a reply (records or error object) has been written.
    /// Returns Err only when writing fails or when a failure happens after
    /// part of the array was already sent.
    pub fn respond<W: Write>(&self, line: &str, writer: &mut W) -> Result<()> {
        let prepared = SelectRequest::from_json(line).and_then(|request| {
            let (range, partitions) = self.resolve(&request)?;
            Ok((request, range, partitions))
        });

        let (request, range, partitions) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => return self.reject(writer, &e),
        };

        let mut array = JsonArrayWriter::new(writer);
        for batch in query::select(partitions, range.start, range.end) {
            match batch {
                Ok(records) => array.write_batch(&records)?,
                Err(e) if !array.is_committed() => return self.reject(array.into_inner(), &e),
                Err(e) => {
                    tracing::error!(
                        file = %request.file_name,
                        sent = array.record_count(),
                        error = %e,
                        "Select failed mid-stream"
                    );
                    return Err(e);
                }
            }
        }

        let count = array.finish()?;
        writer.write_all(b"\n")?;

        tracing::debug!(
            file = %request.file_name,
            from = %request.from,
            to = %request.to,
            records = count,
            "Select served"
        );
        Ok(())
    }

    fn reject<W: Write>(&self, writer: &mut W, error: &ShardError) -> Result<()> {
        if error.is_client_error() {
            tracing::warn!(error = %error, "Select request rejected");
        } else {
            tracing::error!(error = %error, "Select request failed");
        }
        write_error_response(writer, &ErrorResponse::from_error(error))
    }
}

/// Stream the records of `partitions` in `[start, end]` as one JSON array.
///
/// Returns the number of records written.
pub fn write_records<P: Partition, W: Write>(
    partitions: &[P],
    start: i64,
    end: i64,
    writer: &mut W,
) -> Result<usize> {
    let mut array = JsonArrayWriter::new(writer);
    for batch in query::select(partitions, start, end) {
        array.write_batch(&batch?)?;
    }
    array.finish()
}
