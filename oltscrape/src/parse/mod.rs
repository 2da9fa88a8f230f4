//! Parsers for device command output.
//!
//! Each parser is a pure function from the text of one command to a
//! [`ParseOutcome`]: the records it could extract plus a warning for every
//! line it had to skip. A bad line never aborts the parse.

mod autofind;
mod board;
mod optical;
mod summary;

use std::fmt;

use log::warn;

pub use autofind::parse_autofind;
pub use board::parse_board_ports;
pub use optical::{OpticalReading, parse_unit_optical};
pub use summary::{SummaryRow, parse_unit_summary};

/// Why a line was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// The line looked like a record but a column did not convert.
    Malformed,
    /// A record was missing a field it cannot be built without.
    MissingField,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::Malformed => write!(f, "malformed"),
            WarningKind::MissingField => write!(f, "missing field"),
        }
    }
}

/// A skipped line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based line number in the command output.
    pub line: usize,
    /// The offending line, trimmed.
    pub text: String,
    /// Category of the problem.
    pub kind: WarningKind,
    /// What was wrong.
    pub detail: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {} ({}): {}: {:?}",
            self.line, self.kind, self.detail, self.text
        )
    }
}

/// Records extracted from one command output, plus skipped lines.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome<T> {
    /// Parsed records, in output order.
    pub records: Vec<T>,
    /// One entry per skipped line.
    pub warnings: Vec<ParseWarning>,
}

impl<T> ParseOutcome<T> {
    /// An outcome with no records and no warnings.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Whether every candidate line parsed.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Drop the warnings.
    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    /// Record and log a skipped line.
    pub(crate) fn skip(
        &mut self,
        line: usize,
        text: &str,
        kind: WarningKind,
        detail: impl Into<String>,
    ) {
        let warning = ParseWarning {
            line,
            text: text.to_string(),
            kind,
            detail: detail.into(),
        };
        warn!("skipping {}", warning);
        self.warnings.push(warning);
    }
}

impl<T> Default for ParseOutcome<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Unit and port ids are plain decimal numbers.
pub(crate) fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}
