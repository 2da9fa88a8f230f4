//! Pattern matching utilities for prompt detection.

use regex::bytes::Regex;

/// Trait for prompt matching - regex by default, extensible for custom matchers.
pub trait PromptMatcher: Send + Sync {
    /// Returns byte offset where match ends, or None if no match.
    fn find_match(&self, data: &[u8]) -> Option<usize>;

    /// Check if the data matches the pattern.
    fn is_match(&self, data: &[u8]) -> bool {
        self.find_match(data).is_some()
    }
}

/// Regex-based prompt matcher (the default implementation).
impl PromptMatcher for Regex {
    fn find_match(&self, data: &[u8]) -> Option<usize> {
        self.find(data).map(|m| m.end())
    }
}

/// A compiled prompt pattern with optional negative matches.
#[derive(Debug, Clone)]
pub struct CompiledPrompt {
    /// The main pattern to match.
    pattern: Regex,

    /// Substrings that must NOT be present for a match.
    not_contains: Vec<String>,
}

impl CompiledPrompt {
    /// Create a new compiled prompt from a pattern string.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            not_contains: Vec::new(),
        })
    }

    /// Create a compiled prompt with negative patterns.
    pub fn with_not_contains(pattern: &str, not_contains: Vec<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            not_contains,
        })
    }

    /// Get a reference to the underlying regex.
    pub fn regex(&self) -> &Regex {
        &self.pattern
    }
}

impl PromptMatcher for CompiledPrompt {
    fn find_match(&self, data: &[u8]) -> Option<usize> {
        let data_str = String::from_utf8_lossy(data);
        if self.not_contains.iter().any(|nc| data_str.contains(nc.as_str())) {
            return None;
        }

        self.pattern.find(data).map(|m| m.end())
    }
}

/// Last non-blank line of `output`, trimmed; this is where the prompt sits.
pub fn trailing_line(output: &str) -> &str {
    let trimmed = output.trim_end();
    let start = memchr::memrchr(b'\n', trimmed.as_bytes()).map_or(0, |pos| pos + 1);
    trimmed[start..].trim()
}
