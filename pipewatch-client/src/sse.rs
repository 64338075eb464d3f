//! Server-sent events decoding
//!
//! Incremental decoder for `text/event-stream` bodies. Bytes are fed as they
//! arrive; complete events come out as their joined `data` payload. Only the
//! `data` field matters to pipewatch, so `event`, `id` and `retry` are skipped.

use tracing::warn;

/// Longest line kept in memory; longer lines drop their event
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// Incremental event-stream decoder
#[derive(Debug)]
pub struct SseDecoder {
    /// Bytes of the current, not yet terminated line
    buffer: Vec<u8>,
    /// `data` lines of the event being assembled
    data: Vec<String>,
    max_line: usize,
    /// The last line ended with `\r`; a directly following `\n` belongs to it
    skip_lf: bool,
    /// Inside an oversized line, dropping bytes until its terminator
    discarding: bool,
    /// The current event lost a line and is dropped at its blank line
    truncated: bool,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buffer: Vec::new(),
            data: Vec::new(),
            max_line,
            skip_lf: false,
            discarding: false,
            truncated: false,
        }
    }

    /// Feeds a chunk and returns the payloads of all events it completed
    ///
    /// Lines end with `\r\n`, `\n` or a bare `\r`.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut events = Vec::new();

        for &byte in chunk {
            if std::mem::take(&mut self.skip_lf) && byte == b'\n' {
                continue;
            }

            match byte {
                b'\r' | b'\n' => {
                    self.skip_lf = byte == b'\r';
                    let line = std::mem::take(&mut self.buffer);
                    if std::mem::take(&mut self.discarding) {
                        continue;
                    }
                    if let Some(payload) = self.process_line(&String::from_utf8_lossy(&line)) {
                        events.push(payload);
                    }
                }
                _ if self.discarding => {}
                _ if self.buffer.len() >= self.max_line => {
                    warn!(limit = self.max_line, "Dropping event with an oversized line");
                    self.buffer = Vec::new();
                    self.discarding = true;
                    self.truncated = true;
                }
                _ => self.buffer.push(byte),
            }
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if std::mem::take(&mut self.truncated) {
                self.data.clear();
                return None;
            }
            if self.data.is_empty() {
                return None;
            }
            let payload = self.data.join("\n");
            self.data.clear();
            return Some(payload);
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }
}
