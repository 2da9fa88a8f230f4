//! Modal CLI context tracked by the session.

use std::fmt;

/// Where the remote CLI cursor currently sits.
///
/// `Global` covers both user and privileged mode: the session only passes
/// through it while connecting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CliContext {
    /// No live connection.
    #[default]
    Disconnected,
    /// Logged in, not yet in configuration mode.
    Global,
    /// Global configuration mode.
    Config,
    /// Interface configuration for a board.
    Interface(String),
}

impl CliContext {
    /// Whether a connection is established and configuration mode reached.
    pub fn is_ready(&self) -> bool {
        matches!(self, CliContext::Config | CliContext::Interface(_))
    }

    /// The board whose interface is open, if any.
    pub fn board(&self) -> Option<&str> {
        match self {
            CliContext::Interface(board) => Some(board),
            _ => None,
        }
    }
}

impl fmt::Display for CliContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliContext::Disconnected => write!(f, "disconnected"),
            CliContext::Global => write!(f, "global"),
            CliContext::Config => write!(f, "config"),
            CliContext::Interface(board) => write!(f, "interface {board}"),
        }
    }
}
