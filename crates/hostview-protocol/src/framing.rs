//! Response accumulation.
//!
//! The wire protocol has no length prefix or delimiter: after the request
//! token the server streams one JSON document and closes. TCP may split that
//! document across any number of reads, so bytes are accumulated until a
//! complete document can be recognised:
//!
//! ```text
//! chunk 1: [{"ip":"10.0.0.1","na        -> Incomplete
//! chunk 2: me":"n","description":"d"}]  -> Complete(Ok([..]))
//! ```
//!
//! Each pushed chunk is scanned once for structure (nesting, strings,
//! escapes); the JSON parser only runs when the document has ended.

use hostview_core::Record;

use crate::MAX_RESPONSE_SIZE;
use crate::codec::decode;
use crate::error::{DecodeError, DecodeResult};

/// State of an accumulating response after a chunk was pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// No complete JSON document yet; keep reading.
    Incomplete,
    /// A complete document was recognised and decoded (or rejected).
    Complete(DecodeResult<Vec<Record>>),
}

/// Per-connection buffer that turns raw chunks into a decoded response.
#[derive(Debug)]
pub struct ResponseBuffer {
    data: Vec<u8>,
    max_size: usize,
    scanner: Scanner,
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseBuffer {
    /// Creates an empty buffer limited to [`MAX_RESPONSE_SIZE`].
    pub fn new() -> Self {
        Self::with_max_size(MAX_RESPONSE_SIZE)
    }

    /// Creates an empty buffer with a custom size limit.
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            data: Vec::new(),
            max_size,
            scanner: Scanner::default(),
        }
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drops everything buffered so far.
    pub fn clear(&mut self) {
        self.data.clear();
        self.scanner = Scanner::default();
    }

    /// Appends a chunk and checks whether a full document is available.
    ///
    /// Only the new bytes are examined. A complete result empties the
    /// buffer; bytes following the first document are discarded with it.
    pub fn push(&mut self, chunk: &[u8]) -> Progress {
        let size = self.data.len() + chunk.len();
        if size > self.max_size {
            self.clear();
            return Progress::Complete(Err(DecodeError::TooLarge {
                size,
                max: self.max_size,
            }));
        }
        self.data.extend_from_slice(chunk);

        match self.scanner.scan(&self.data) {
            None => Progress::Incomplete,
            Some(end) => {
                let result = decode(&self.data[..end]);
                self.clear();
                Progress::Complete(result)
            }
        }
    }

    /// Decodes whatever is left once the peer closed the stream.
    ///
    /// Returns `None` when nothing but whitespace was received.
    pub fn finish(&mut self) -> Option<DecodeResult<Vec<Record>>> {
        let data = std::mem::take(&mut self.data);
        self.scanner = Scanner::default();
        if data.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        Some(decode(&data))
    }
}

/// Resumable structural scan over the accumulated bytes.
#[derive(Debug, Default)]
struct Scanner {
    /// Bytes already examined.
    offset: usize,
    /// First significant byte of the document.
    first: Option<u8>,
    /// Open `[` / `{`, innermost last.
    open: Vec<u8>,
    in_string: bool,
    escaped: bool,
}

impl Scanner {
    /// Continues from the last position. Returns the length of the document
    /// prefix once it has ended, or once it can no longer be valid JSON so
    /// that the parser reports the error.
    fn scan(&mut self, data: &[u8]) -> Option<usize> {
        while let Some(&byte) = data.get(self.offset) {
            self.offset += 1;

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                    if self.open.is_empty() {
                        return Some(self.offset);
                    }
                }
                continue;
            }

            match self.first {
                None => {
                    if byte.is_ascii_whitespace() {
                        continue;
                    }
                    self.first = Some(byte);
                    match byte {
                        b'[' | b'{' => self.open.push(byte),
                        b'"' => self.in_string = true,
                        b'-' | b'0'..=b'9' | b't' | b'f' | b'n' => {}
                        _ => return Some(self.offset),
                    }
                }
                Some(b'[' | b'{') => match byte {
                    b'"' => self.in_string = true,
                    b'[' | b'{' => self.open.push(byte),
                    b']' | b'}' => {
                        let opener = if byte == b']' { b'[' } else { b'{' };
                        if self.open.pop() != Some(opener) || self.open.is_empty() {
                            return Some(self.offset);
                        }
                    }
                    _ => {}
                },
                // Bare number or literal: ends at the first byte that cannot
                // continue it.
                Some(_) => {
                    if !(byte.is_ascii_alphanumeric() || matches!(byte, b'+' | b'-' | b'.')) {
                        return Some(self.offset - 1);
                    }
                }
            }
        }
        None
    }
}
