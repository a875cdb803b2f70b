//! Incremental NDJSON decoding
//!
//! Network chunks do not respect line boundaries. The decoder buffers raw
//! bytes, hands back every complete line as soon as its newline arrives and
//! keeps the trailing partial line for the next chunk. Buffering bytes
//! rather than text keeps multi-byte UTF-8 characters split across chunks
//! intact.

use domain_claims::StreamResult;

/// One non-blank line of the stream
#[derive(Debug)]
pub enum DecodedLine {
    Event(StreamResult),
    /// The line is not a valid stream event
    Malformed {
        line: String,
        error: serde_json::Error,
    },
}

/// Line-splitting decoder for the processing stream
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and decodes every line it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<DecodedLine> {
        self.buffer.extend_from_slice(chunk);
        let Some(last_newline) = self.buffer.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let partial = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, partial);
        complete.split(|&b| b == b'\n').filter_map(decode_line).collect()
    }

    /// Decodes whatever is left once the stream has ended
    pub fn finish(&mut self) -> Option<DecodedLine> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }

    /// Bytes waiting for their newline
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(raw: &[u8]) -> Option<DecodedLine> {
    let text = String::from_utf8_lossy(raw);
    let line = text.trim();
    if line.is_empty() {
        return None;
    }
    Some(match serde_json::from_str::<StreamResult>(line) {
        Ok(event) => DecodedLine::Event(event),
        Err(error) => DecodedLine::Malformed {
            line: line.to_string(),
            error,
        },
    })
}
