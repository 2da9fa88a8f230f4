//! Error types for oltscrape.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for oltscrape operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors (prompt matching, timeouts)
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// CLI context and command errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Query argument errors
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether this error is a command timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Channel(ChannelError::PatternTimeout(_))
                | Error::Transport(TransportError::Timeout(_))
        )
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host is not present in known_hosts (strict verification)
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern matching on the interactive shell).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Session layer errors (modal context transitions, command execution).
#[derive(Error, Debug)]
pub enum SessionError {
    /// No live connection
    #[error("Session not connected - call connect() first")]
    NotConnected,

    /// A context transition was sent but the expected prompt never appeared
    #[error("Command '{command}' did not reach {expected} context (prompt: '{prompt}')")]
    TransitionUnconfirmed {
        command: String,
        expected: String,
        prompt: String,
    },

    /// The device rejected a command
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    /// A caller-level query deadline expired
    #[error("Query did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

/// Query argument errors.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Board or port identifier is not a decimal number
    #[error("Invalid {kind} identifier: '{value}'")]
    InvalidIdentifier { kind: &'static str, value: String },
}

/// Configuration errors from the session builder.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required setting was not provided
    #[error("Missing required setting: {0}")]
    MissingField(&'static str),

    /// Setting could not be interpreted
    #[error("Invalid value for {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },
}

/// Result type alias using oltscrape's Error.
pub type Result<T> = std::result::Result<T, Error>;
