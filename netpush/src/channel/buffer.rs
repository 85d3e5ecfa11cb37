//! Output accumulator for a single command.
//!
//! Collects every chunk read for one command while remembering where the
//! latest chunk starts, since pager detection only looks at the newest read.

use bytes::BytesMut;
use memchr::memmem;

/// Buffer accumulating the output of one command across pager pages.
#[derive(Debug)]
pub struct TranscriptBuffer {
    /// All output read so far.
    buffer: BytesMut,

    /// Offset where the most recent chunk begins.
    last_chunk_start: usize,

    /// Number of chunks pushed.
    chunks: usize,
}

impl TranscriptBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            last_chunk_start: 0,
            chunks: 0,
        }
    }

    /// Append a freshly read chunk.
    pub fn push(&mut self, chunk: &[u8]) {
        self.last_chunk_start = self.buffer.len();
        self.buffer.extend_from_slice(chunk);
        self.chunks += 1;
    }

    /// The most recently pushed chunk.
    pub fn last_chunk(&self) -> &[u8] {
        &self.buffer[self.last_chunk_start..]
    }

    /// Check if the most recent chunk contains `marker`.
    ///
    /// An empty marker never matches.
    pub fn last_chunk_contains(&self, marker: &[u8]) -> bool {
        !marker.is_empty() && memmem::find(self.last_chunk(), marker).is_some()
    }

    /// Number of chunks pushed so far.
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Get the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Decode the contents as ASCII, replacing other bytes with U+FFFD.
    pub fn to_ascii_lossy(&self) -> String {
        decode_ascii_lossy(&self.buffer)
    }
}

impl Default for TranscriptBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode bytes as ASCII. Bytes above 0x7f become U+FFFD.
pub fn decode_ascii_lossy(data: &[u8]) -> String {
    data.iter()
        .map(|&b| {
            if b.is_ascii() {
                b as char
            } else {
                char::REPLACEMENT_CHARACTER
            }
        })
        .collect()
}
