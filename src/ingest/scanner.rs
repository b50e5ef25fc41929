//! Line Scanner
//!
//! Reads a source stream one line at a time, reusing a single buffer.

use std::io::{self, BufRead};

/// Yields raw lines (without the trailing `\n` / `\r\n`) and their 1-based number
pub struct LineScanner<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: u64,
}

impl<R: BufRead> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_number: 0,
        }
    }

    /// Next line, or None at end of input. Read errors are returned as-is.
    pub fn next_line(&mut self) -> io::Result<Option<(u64, &[u8])>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        let mut line = self.buf.as_slice();
        if let Some(rest) = line.strip_suffix(b"\n") {
            line = rest;
        }
        if let Some(rest) = line.strip_suffix(b"\r") {
            line = rest;
        }
        Ok(Some((self.line_number, line)))
    }

    /// Number of lines read so far
    pub fn line_number(&self) -> u64 {
        self.line_number
    }
}
