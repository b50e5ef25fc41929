//! Query Client
//!
//! Blocking client for the line-delimited JSON protocol.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::TcpStream;

use crate::error::{Result, ShardError};
use crate::record::ApiRecord;
use crate::service::{Reply, SelectRequest};

/// A connection to a timeshard server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to `addr` (host:port)
    pub fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| ShardError::Network(format!("Failed to connect to {}: {}", addr, e)))?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Send a raw request line and return the raw reply line
    pub fn send_line(&mut self, request: &str) -> Result<String> {
        self.writer.write_all(request.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        let mut reply = String::new();
        if self.reader.read_line(&mut reply)? == 0 {
            return Err(ShardError::Protocol(
                "Server closed the connection without replying".to_string(),
            ));
        }
        if !reply.ends_with('\n') {
            return Err(ShardError::Protocol("Truncated reply".to_string()));
        }
        Ok(reply)
    }

    /// Send `request` and parse the reply
    pub fn request(&mut self, request: &SelectRequest) -> Result<Reply> {
        let reply = self.send_line(&request.to_json()?)?;
        Reply::parse(&reply)
    }

    /// Send `request`, turning an error reply into an Err
    pub fn select(&mut self, request: &SelectRequest) -> Result<Vec<ApiRecord>> {
        match self.request(request)? {
            Reply::Records(records) => Ok(records),
            Reply::Error(response) => Err(ShardError::Network(format!(
                "{:?}: {}",
                response.error.kind, response.error.message
            ))),
        }
    }
}
