//! Pattern buffer with efficient tail-search optimization.
//!
//! Only the last N bytes of the accumulated output are searched for prompt
//! patterns. A `display ont optical-info` on a full port runs to hundreds
//! of lines and every chunk triggers a search, so this matters.

use std::fmt;

use regex::bytes::Regex;
use vte::{Parser, Perform};

use super::patterns::PromptMatcher;

/// Buffer for accumulating output and efficiently searching for patterns.
///
/// Incoming bytes are run through a VT parser so cursor movement and
/// colour sequences (the device erases its pager marker with `ESC[37D`)
/// never reach the stored text. Carriage returns are dropped, leaving
/// plain `\n`-delimited lines.
pub struct PatternBuffer {
    /// The accumulated output buffer.
    buffer: Vec<u8>,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,

    /// Escape-sequence state carried across chunk boundaries.
    parser: Parser,
}

/// Collects printable text from the VT parser.
struct Printable<'a> {
    out: &'a mut Vec<u8>,
}

impl Perform for Printable<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\t') {
            self.out.push(byte);
        }
    }
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
            parser: Parser::new(),
        }
    }

    /// Extend the buffer with new data, stripping escape sequences.
    pub fn extend(&mut self, data: &[u8]) {
        let mut printable = Printable {
            out: &mut self.buffer,
        };
        self.parser.advance(&mut printable, data);
    }

    /// Check if the tail satisfies a prompt matcher.
    pub fn tail_matches<M: PromptMatcher + ?Sized>(&self, matcher: &M) -> bool {
        matcher.is_match(self.tail())
    }

    /// Remove the first match of `pattern` found in the tail.
    ///
    /// Returns whether anything was removed.
    pub fn strip_tail_match(&mut self, pattern: &Regex) -> bool {
        let offset = self.tail_offset();
        let range = match pattern.find(&self.buffer[offset..]) {
            Some(m) => (offset + m.start())..(offset + m.end()),
            None => return false,
        };
        self.buffer.drain(range);
        true
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Clear the buffer and any half-read escape sequence.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.parser = Parser::new();
    }

    fn tail_offset(&self) -> usize {
        self.buffer.len().saturating_sub(self.search_depth)
    }

    fn tail(&self) -> &[u8] {
        &self.buffer[self.tail_offset()..]
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("len", &self.buffer.len())
            .field("search_depth", &self.search_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl PatternBuffer {
        fn is_empty(&self) -> bool {
            self.buffer.is_empty()
        }
    }

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.as_slice(), b"Hello, world!");
    }

    #[test]
    fn test_escape_and_carriage_return_stripping() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mline\x1b[0m\r\n\x1b[37D     \x1b[37Dnext");
        assert_eq!(buffer.as_slice(), b"line\n     next");
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"abc\x1b[3");
        buffer.extend(b"7Ddef");
        assert_eq!(buffer.as_slice(), b"abcdef");
    }

    #[test]
    fn test_tail_search() {
        let mut buffer = PatternBuffer::new(20);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\nOLT(config)#");

        let pattern = Regex::new(r"OLT\(config\)#").unwrap();
        assert!(buffer.tail_matches(&pattern));
    }

    #[test]
    fn test_tail_search_not_in_tail() {
        let mut buffer = PatternBuffer::new(10);
        buffer.extend(b"OLT#");
        buffer.extend(&[b'x'; 100]);

        let pattern = Regex::new(r"OLT#").unwrap();
        assert!(!buffer.tail_matches(&pattern));
        assert!(buffer.as_slice().starts_with(b"OLT#"));
    }

    #[test]
    fn test_strip_tail_match() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"row 1\n  ---- More ( Press 'Q' to quit ) ----");

        let pager = Regex::new(r"-+ More \( Press 'Q' to quit \) -+").unwrap();
        assert!(buffer.strip_tail_match(&pager));
        assert_eq!(buffer.as_slice(), b"row 1\n  ");
        assert!(!buffer.strip_tail_match(&pager));
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"test data");
        assert_eq!(buffer.take(), b"test data");
        assert!(buffer.is_empty());
    }
}
