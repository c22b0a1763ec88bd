//! Pattern buffer with tail-search.
//!
//! Prompt detection only looks at the last `search_depth` bytes of the
//! accumulated output. A full running-config can be several megabytes, the
//! prompt is always at the end.

use regex::bytes::Regex;

/// Buffer for accumulating session output and locating prompts in its tail.
#[derive(Debug)]
pub struct PatternBuffer {
    buffer: Vec<u8>,
    /// Unfinished escape sequence from the end of the last chunk.
    pending: Vec<u8>,
    search_depth: usize,
}

impl PatternBuffer {
    /// Create a buffer that searches the last `search_depth` bytes.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            pending: Vec::new(),
            search_depth,
        }
    }

    /// Append raw session bytes with ANSI escape sequences removed.
    ///
    /// A sequence cut off at the end of `data` is held back until the next
    /// chunk completes it.
    pub fn extend(&mut self, data: &[u8]) {
        let mut raw = std::mem::take(&mut self.pending);
        raw.extend_from_slice(data);

        let complete = unfinished_escape(&raw).unwrap_or(raw.len());
        self.pending = raw.split_off(complete);

        let cleaned = strip_ansi_escapes::strip(&raw);
        self.buffer.extend_from_slice(&cleaned);
    }

    /// Find `pattern` in the tail and return the absolute `(start, end)` of
    /// the match within the whole buffer.
    pub fn find_in_tail(&self, pattern: &Regex) -> Option<(usize, usize)> {
        let offset = self.buffer.len().saturating_sub(self.search_depth);
        pattern
            .find(&self.buffer[offset..])
            .map(|m| (offset + m.start(), offset + m.end()))
    }

    /// Remove and return everything up to `end`, keeping the rest buffered.
    pub fn drain_to(&mut self, end: usize) -> Vec<u8> {
        let end = end.min(self.buffer.len());
        let rest = self.buffer.split_off(end);
        std::mem::replace(&mut self.buffer, rest)
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

const ESC: u8 = 0x1b;
const BEL: u8 = 0x07;
/// Longer "sequences" are line noise, not escapes; let them through.
const MAX_PENDING: usize = 256;

/// Start of an escape sequence that `data` ends in the middle of.
fn unfinished_escape(data: &[u8]) -> Option<usize> {
    let start = data.iter().rposition(|&b| b == ESC)?;
    let rest = &data[start + 1..];
    if rest.len() >= MAX_PENDING {
        return None;
    }

    let finished = match rest.first() {
        None => false,
        // CSI: parameters and intermediates, then one final byte
        Some(b'[') => rest[1..].iter().any(|b| (0x40..=0x7e).contains(b)),
        // OSC: up to BEL (ST's own ESC would be the last one seen)
        Some(b']') => rest.contains(&BEL),
        Some(_) => true,
    };
    (!finished).then_some(start)
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}
