//! CLI dialect definition.
//!
//! A [`Dialect`] bundles everything the session needs to know about the
//! device's command line: prompt shapes for each modal context, the
//! commands that move between contexts, failure markers, and the pager
//! and parameter-continuation prompts the device may interject.
//!
//! Only one dialect ships ([`huawei::smartax`]); the struct exists so the
//! prompt/command knowledge lives in one place rather than being scattered
//! through the session state machine.

pub mod huawei;

use std::fmt;

use regex::bytes::Regex;

use crate::channel::{CompiledPrompt, PromptMatcher};

/// Modal context identified from a prompt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    /// User mode (`host>`).
    User,
    /// Privileged mode (`host#`).
    Privileged,
    /// Global configuration mode (`host(config)#`).
    Config,
    /// Interface configuration for the given board (`host(config-if-gpon-0/2)#`).
    Interface(String),
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptKind::User => write!(f, "user"),
            PromptKind::Privileged => write!(f, "privileged"),
            PromptKind::Config => write!(f, "config"),
            PromptKind::Interface(board) => write!(f, "interface {board}"),
        }
    }
}

/// Prompt patterns, transition commands and markers for one CLI dialect.
#[derive(Debug, Clone)]
pub struct Dialect {
    /// Dialect name (e.g., "huawei_smartax").
    pub name: String,

    /// Frame number used when addressing boards (`<frame>/<board>`).
    pub frame: String,

    /// Matches any prompt the device can show; the terminator for transitions.
    pub any_prompt: Regex,

    /// User mode prompt.
    pub user_prompt: CompiledPrompt,

    /// Privileged mode prompt.
    pub privileged_prompt: CompiledPrompt,

    /// Global configuration prompt.
    pub config_prompt: CompiledPrompt,

    /// Captures `(frame, board)` from an interface prompt.
    pub interface_capture: Regex,

    /// Interface prompt pattern; `{frame}` and `{board}` are substituted.
    pub interface_prompt_template: String,

    /// Command escalating from user to privileged mode.
    pub elevate_command: String,

    /// Command entering global configuration mode.
    pub config_command: String,

    /// Command entering an interface; `{frame}` and `{board}` are substituted.
    pub interface_command_template: String,

    /// Command leaving an interface back to configuration mode.
    pub exit_interface_command: String,

    /// Commands run once configuration mode is reached after connecting.
    pub on_open_commands: Vec<String>,

    /// Output substrings that mark a rejected command.
    pub failed_when_contains: Vec<String>,

    /// Pager marker that must be answered with a space.
    pub pager: Option<Regex>,

    /// Parameter-continuation prompt that must be answered with a newline.
    pub continuation: Option<Regex>,
}

impl Dialect {
    /// Command that enters the interface of `board`.
    pub fn interface_command(&self, board: &str) -> String {
        self.interface_command_template
            .replace("{frame}", &self.frame)
            .replace("{board}", board)
    }

    /// Prompt pattern confirming the interface of `board` is open.
    pub fn interface_prompt(&self, board: &str) -> Result<Regex, regex::Error> {
        let pattern = self
            .interface_prompt_template
            .replace("{frame}", &regex::escape(&self.frame))
            .replace("{board}", &regex::escape(board));
        Regex::new(&pattern)
    }

    /// Identify the modal context from a prompt line.
    pub fn classify(&self, prompt: &str) -> Option<PromptKind> {
        let bytes = prompt.as_bytes();

        if let Some(caps) = self.interface_capture.captures(bytes) {
            let board = caps
                .get(2)
                .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())?;
            return Some(PromptKind::Interface(board));
        }
        if self.config_prompt.is_match(bytes) {
            return Some(PromptKind::Config);
        }
        if self.privileged_prompt.is_match(bytes) {
            return Some(PromptKind::Privileged);
        }
        if self.user_prompt.is_match(bytes) {
            return Some(PromptKind::User);
        }
        None
    }

    /// Return the first failure marker present in `output`, if any.
    pub fn detect_failure(&self, output: &str) -> Option<String> {
        self.failed_when_contains
            .iter()
            .find(|marker| output.contains(marker.as_str()))
            .cloned()
    }

    /// Strip the command echo and the trailing prompt from raw output.
    pub fn normalize_output(&self, raw: &str, command: &str) -> String {
        let command = command.trim();
        let body = match raw.split_once('\n') {
            Some((first, rest)) if !command.is_empty() && first.trim_end().ends_with(command) => {
                rest
            }
            _ => raw,
        };

        let trimmed = body.trim_end();
        let (head, last) = trimmed.rsplit_once('\n').unwrap_or(("", trimmed));
        let body = if self.any_prompt.is_match(last.as_bytes()) {
            head
        } else {
            trimmed
        };

        body.trim_matches('\n').to_string()
    }

    /// Add a command to run after configuration mode is reached.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Add a failure marker.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Set the frame number used for board addressing.
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.frame = frame.into();
        self
    }
}

impl Default for Dialect {
    fn default() -> Self {
        huawei::smartax()
    }
}
