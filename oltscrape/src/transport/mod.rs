//! Transport layer: the duplex byte channel to the device.
//!
//! The session layer only needs to write bytes, read chunks as they
//! arrive, and know whether the link is still up. [`SshTransport`] is the
//! production implementation; anything else that can satisfy [`Transport`]
//! (a test double, a serial console bridge) plugs in through a
//! [`Connector`].

pub mod config;
#[cfg(test)]
pub(crate) mod mock;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::{SshConnector, SshTransport};

use std::future::Future;

use bytes::Bytes;

use crate::error::Result;

/// A connected duplex byte channel to the device shell.
pub trait Transport: Send {
    /// Write raw bytes to the remote shell.
    fn send(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Wait for the next chunk of output.
    ///
    /// Returns `Ok(None)` once the remote side has closed the channel.
    fn recv(&mut self) -> impl Future<Output = Result<Option<Bytes>>> + Send;

    /// Whether the underlying connection is still usable.
    fn is_alive(&self) -> bool;

    /// Close the connection.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Factory for fresh transports, used by the session to (re)connect.
pub trait Connector: Send + Sync {
    /// The transport produced by this connector.
    type Transport: Transport;

    /// Dial and authenticate a new connection.
    fn connect(&self) -> impl Future<Output = Result<Self::Transport>> + Send;

    /// Human readable target, for logging.
    fn target(&self) -> String;
}
