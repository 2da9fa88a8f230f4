//! Command execution over a raw transport.
//!
//! [`CommandChannel`] is the thin layer between the session state machine
//! and the byte channel: it types a command (pausing before Enter so a slow
//! device can finish echoing), then reads until a prompt pattern shows up
//! at the end of the output or the deadline passes. Pager markers and
//! `{ <cr>|... }:` parameter prompts are answered along the way.

use std::time::Duration;

use log::{debug, trace};
use regex::bytes::Regex;
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use super::patterns::PromptMatcher;
use crate::error::{ChannelError, Result};
use crate::transport::Transport;

/// Per-command execution options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecOptions {
    /// How long to wait for the terminating prompt.
    pub timeout: Duration,

    /// Multiplier applied to the channel's keystroke delay.
    pub delay_factor: f64,
}

impl ExecOptions {
    /// Options with the given timeout and delay factor.
    pub fn new(timeout: Duration, delay_factor: f64) -> Self {
        Self {
            timeout,
            delay_factor,
        }
    }

    /// Same options with a different timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Same options with a different delay factor.
    pub fn with_delay_factor(mut self, delay_factor: f64) -> Self {
        self.delay_factor = delay_factor;
        self
    }
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            delay_factor: 1.0,
        }
    }
}

/// Configuration for a [`CommandChannel`].
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Pause between typing a command and pressing Enter, before scaling.
    pub keystroke_delay: Duration,

    /// Search depth for prompt matching.
    pub search_depth: usize,

    /// Pager marker answered with a space.
    pub pager: Option<Regex>,

    /// Parameter prompt answered with a newline.
    pub continuation: Option<Regex>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            keystroke_delay: Duration::from_millis(100),
            search_depth: 1000,
            pager: None,
            continuation: None,
        }
    }
}

/// Send/read-until wrapper around a transport.
pub struct CommandChannel<T> {
    transport: T,
    buffer: PatternBuffer,
    config: ChannelConfig,
}

impl<T: Transport> CommandChannel<T> {
    /// Wrap a connected transport.
    pub fn new(transport: T, config: ChannelConfig) -> Self {
        Self {
            transport,
            buffer: PatternBuffer::new(config.search_depth),
            config,
        }
    }

    /// Whether the underlying transport is still usable.
    pub fn is_alive(&self) -> bool {
        self.transport.is_alive()
    }

    /// Type a command and press Enter.
    ///
    /// Any unread output left from a previous exchange is discarded first.
    pub async fn send_command(&mut self, command: &str, options: &ExecOptions) -> Result<()> {
        self.buffer.clear();

        debug!("sending {:?}", command);
        self.transport.send(command.as_bytes()).await?;

        let delay = self.keystroke_delay(options);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.transport.send(b"\n").await
    }

    /// Read until `matcher` hits the end of the output.
    ///
    /// Returns everything read, escape sequences stripped, including the
    /// matched prompt.
    pub async fn read_until<M: PromptMatcher + ?Sized>(
        &mut self,
        matcher: &M,
        timeout: Duration,
    ) -> Result<String> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(pager) = &self.config.pager {
                if self.buffer.strip_tail_match(pager) {
                    trace!("answering pager");
                    self.transport.send(b" ").await?;
                }
            }

            if self.buffer.tail_matches(matcher) {
                let data = self.buffer.take();
                return Ok(String::from_utf8_lossy(&data).into_owned());
            }

            if let Some(continuation) = &self.config.continuation {
                if self.buffer.tail_matches(continuation) {
                    trace!("answering parameter prompt");
                    self.transport.send(b"\n").await?;
                }
            }

            let chunk = match tokio::time::timeout_at(deadline, self.transport.recv()).await {
                Ok(result) => result?.ok_or(ChannelError::Closed)?,
                Err(_) => {
                    debug!(
                        "no prompt within {:?}; tail: {:?}",
                        timeout,
                        super::patterns::trailing_line(&self.buffer.as_str_lossy())
                    );
                    return Err(ChannelError::PatternTimeout(timeout).into());
                }
            };

            trace!("read {} bytes", chunk.len());
            self.buffer.extend(&chunk);
        }
    }

    /// Send a command and read until `matcher`.
    pub async fn execute<M: PromptMatcher + ?Sized>(
        &mut self,
        command: &str,
        matcher: &M,
        options: &ExecOptions,
    ) -> Result<String> {
        self.send_command(command, options).await?;
        self.read_until(matcher, options.timeout).await
    }

    /// Close the transport.
    pub async fn close(mut self) -> Result<()> {
        self.transport.close().await
    }

    fn keystroke_delay(&self, options: &ExecOptions) -> Duration {
        if options.delay_factor <= 0.0 || !options.delay_factor.is_finite() {
            return Duration::ZERO;
        }
        self.config.keystroke_delay.mul_f64(options.delay_factor)
    }
}
