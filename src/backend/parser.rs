//! Incremental JSON extraction from a streaming byte sequence
//!
//! The generate endpoint streams newline-delimited JSON objects, but HTTP
//! chunk boundaries fall anywhere, so the parser accumulates bytes and
//! extracts complete objects by brace matching (string- and escape-aware).
//! Single pass, bounded buffer.

use crate::errors::{QaError, Result};

/// Maximum accumulation buffer (1MB)
pub const MAX_BUFFER_SIZE: usize = 1_048_576;

/// Incremental JSON object extractor
#[derive(Debug)]
pub struct StreamParser {
    buffer: Vec<u8>,
    max_buffer_size: usize,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::with_capacity(MAX_BUFFER_SIZE)
    }

    pub fn with_capacity(max_buffer_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            max_buffer_size,
        }
    }

    /// Append stream bytes and extract every complete JSON object now
    /// available, in order.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<Vec<String>> {
        if self.buffer.len() + bytes.len() > self.max_buffer_size {
            return Err(QaError::Stream(format!(
                "stream buffer overflow: {} bytes exceeds maximum {}",
                self.buffer.len() + bytes.len(),
                self.max_buffer_size
            )));
        }

        self.buffer.extend_from_slice(bytes);

        let mut objects = Vec::new();
        while let Some(json) = self.extract_object()? {
            objects.push(json);
        }
        Ok(objects)
    }

    /// Extract the first complete object from the buffer, if any
    fn extract_object(&mut self) -> Result<Option<String>> {
        let Some((start, end)) = self.find_complete_object()? else {
            return Ok(None);
        };

        let json = String::from_utf8_lossy(&self.buffer[start..=end]).to_string();
        self.buffer.drain(..=end);
        Ok(Some(json))
    }

    /// Brace matching over the buffer, ignoring braces inside strings
    fn find_complete_object(&self) -> Result<Option<(usize, usize)>> {
        let mut depth = 0i32;
        let mut start: Option<usize> = None;
        let mut in_string = false;
        let mut escape_next = false;

        for (i, &byte) in self.buffer.iter().enumerate() {
            let ch = byte as char;

            if escape_next {
                escape_next = false;
                continue;
            }
            if ch == '\\' && in_string {
                escape_next = true;
                continue;
            }
            if ch == '"' {
                in_string = !in_string;
                continue;
            }
            if in_string {
                continue;
            }

            match ch {
                '{' => {
                    if depth == 0 {
                        start = Some(i);
                    }
                    depth += 1;
                }
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        if let Some(start) = start {
                            return Ok(Some((start, i)));
                        }
                    }
                    if depth < 0 {
                        return Err(QaError::Stream(
                            "mismatched braces in stream".to_string(),
                        ));
                    }
                }
                _ => {}
            }
        }

        Ok(None)
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}
