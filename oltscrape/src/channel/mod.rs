//! Channel layer: prompt matching and command execution on the shell.
//!
//! This module turns a raw byte [`Transport`](crate::transport::Transport)
//! into something that can run one command at a time and return the text
//! up to the next prompt.

mod buffer;
mod command;
mod patterns;

pub use buffer::PatternBuffer;
pub use command::{ChannelConfig, CommandChannel, ExecOptions};
pub use patterns::{CompiledPrompt, PromptMatcher, trailing_line};
