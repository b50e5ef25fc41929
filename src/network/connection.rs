//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, ShardError};
use crate::service::{write_error_response, ErrorKind, ErrorResponse, QueryService};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Query service shared by all connections
    service: Arc<QueryService>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O on two handles of the same stream
    pub fn new(stream: TcpStream, service: Arc<QueryService>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            service,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 = no timeout)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads one request per line and writes one reply per line. Returns
    /// when the client disconnects, a read times out, or a reply fails
    /// part-way through.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Ok(_) => {}
                Err(ref e) if is_disconnect(e.kind()) => {
                    tracing::debug!("Connection closed by client {}: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(ref e) if is_timeout(e.kind()) => {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(ref e) if e.kind() == io::ErrorKind::InvalidData => {
                    // Not UTF-8; the offending line has been consumed
                    let response =
                        ErrorResponse::new(ErrorKind::BadRequest, "request is not valid UTF-8");
                    let result = write_error_response(&mut self.writer, &response);
                    if !self.finish_reply(result)? {
                        return Ok(());
                    }
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e.into());
                }
            }

            let request = line.trim();
            if request.is_empty() {
                continue;
            }
            tracing::trace!("Received request from {}: {}", self.peer_addr, request);

            let result = self.service.respond(request, &mut self.writer);
            if !self.finish_reply(result)? {
                return Ok(());
            }
        }
    }

    /// Flush a reply. Ok(false) means the client went away.
    fn finish_reply(&mut self, result: Result<()>) -> Result<bool> {
        let result = result.and_then(|_| self.writer.flush().map_err(ShardError::from));
        match result {
            Ok(()) => Ok(true),
            Err(ShardError::Io(ref e)) if is_disconnect(e.kind()) => {
                tracing::debug!(
                    "Client {} disconnected before response could be sent: {}",
                    self.peer_addr,
                    e
                );
                Ok(false)
            }
            Err(e) => {
                tracing::warn!("Error serving {}: {}", self.peer_addr, e);
                Err(e)
            }
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_disconnect(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}

// Windows reports read timeouts as TimedOut instead of WouldBlock
fn is_timeout(kind: io::ErrorKind) -> bool {
    matches!(kind, io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}
