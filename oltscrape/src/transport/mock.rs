//! Test doubles for the transport layer.
//!
//! [`ScriptedTransport`] replays fixed chunks for channel-level tests.
//! [`MockDevice`] emulates the Huawei modal CLI closely enough to drive the
//! session state machine: it echoes commands, tracks its own mode, answers
//! with canned output and the prompt for the mode it ends up in, and logs
//! every command line it receives.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use super::{Connector, Transport};
use crate::error::{Result, TransportError};

/// Replays a fixed list of output chunks and records writes.
pub(crate) struct ScriptedTransport {
    chunks: VecDeque<Bytes>,
    writes: Arc<Mutex<Vec<String>>>,
    close_at_end: bool,
}

impl ScriptedTransport {
    pub(crate) fn new(chunks: Vec<&str>) -> Self {
        Self {
            chunks: chunks
                .into_iter()
                .map(|c| Bytes::copy_from_slice(c.as_bytes()))
                .collect(),
            writes: Arc::new(Mutex::new(Vec::new())),
            close_at_end: false,
        }
    }

    /// Report EOF once the chunks run out instead of going quiet.
    pub(crate) fn closing(mut self) -> Self {
        self.close_at_end = true;
        self
    }

    pub(crate) fn writes(&self) -> Arc<Mutex<Vec<String>>> {
        self.writes.clone()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        self.writes
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(data).into_owned());
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Bytes>> {
        if let Some(chunk) = self.chunks.pop_front() {
            return Ok(Some(chunk));
        }
        if self.close_at_end {
            return Ok(None);
        }
        std::future::pending().await
    }

    fn is_alive(&self) -> bool {
        true
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    User,
    Privileged,
    Config,
    Interface(String),
}

/// Canned behaviour of an emulated OLT.
#[derive(Debug, Clone)]
pub(crate) struct MockDevice {
    hostname: String,
    outputs: HashMap<String, String>,
    silent: HashSet<String>,
    delayed: HashSet<String>,
    rejected: HashSet<String>,
    refuse_connections: bool,
}

impl MockDevice {
    pub(crate) fn new(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            outputs: HashMap::new(),
            silent: HashSet::new(),
            delayed: HashSet::new(),
            rejected: HashSet::new(),
            refuse_connections: false,
        }
    }

    /// Print `output` when `command` is received.
    pub(crate) fn with_output(mut self, command: &str, output: &str) -> Self {
        self.outputs.insert(command.to_string(), output.to_string());
        self
    }

    /// Never answer `command` (not even with a prompt).
    pub(crate) fn silent(mut self, command: &str) -> Self {
        self.silent.insert(command.to_string());
        self
    }

    /// Answer `command` only once the next line arrives, ahead of that
    /// line's own reply.
    pub(crate) fn delayed(mut self, command: &str) -> Self {
        self.delayed.insert(command.to_string());
        self
    }

    /// Reject `command` with an error and stay in the current mode.
    pub(crate) fn rejecting(mut self, command: &str) -> Self {
        self.rejected.insert(command.to_string());
        self
    }

    /// Fail every connection attempt.
    pub(crate) fn refusing_connections(mut self) -> Self {
        self.refuse_connections = true;
        self
    }

    fn prompt(&self, mode: &Mode) -> String {
        match mode {
            Mode::User => format!("{}>", self.hostname),
            Mode::Privileged => format!("{}#", self.hostname),
            Mode::Config => format!("{}(config)#", self.hostname),
            Mode::Interface(board) => format!("{}(config-if-gpon-0/{})#", self.hostname, board),
        }
    }
}

/// Shared record of what the emulated device saw.
#[derive(Debug, Clone, Default)]
pub(crate) struct DeviceLog {
    commands: Arc<Mutex<Vec<String>>>,
    connects: Arc<AtomicUsize>,
    alive: Arc<AtomicBool>,
}

impl DeviceLog {
    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, command: &str) -> usize {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == command)
            .count()
    }

    pub(crate) fn clear(&self) {
        self.commands.lock().unwrap().clear();
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Drop the link as if the device went away.
    pub(crate) fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

/// Connector producing [`MockTransport`]s for one [`MockDevice`].
pub(crate) struct MockConnector {
    device: MockDevice,
    log: DeviceLog,
}

impl MockConnector {
    pub(crate) fn new(device: MockDevice) -> Self {
        Self {
            device,
            log: DeviceLog::default(),
        }
    }

    pub(crate) fn log(&self) -> DeviceLog {
        self.log.clone()
    }
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    async fn connect(&self) -> Result<MockTransport> {
        self.log.connects.fetch_add(1, Ordering::SeqCst);
        if self.device.refuse_connections {
            return Err(TransportError::Disconnected.into());
        }
        self.log.alive.store(true, Ordering::SeqCst);

        let mut pending = VecDeque::new();
        pending.push_back(Bytes::from(format!(
            "\r\n  Welcome to the emulated OLT\r\n\r\n{}",
            self.device.prompt(&Mode::User)
        )));

        Ok(MockTransport {
            device: self.device.clone(),
            log: self.log.clone(),
            mode: Mode::User,
            line: String::new(),
            pending,
            held: None,
        })
    }

    fn target(&self) -> String {
        format!("mock@{}", self.device.hostname)
    }
}

/// One emulated CLI session.
pub(crate) struct MockTransport {
    device: MockDevice,
    log: DeviceLog,
    mode: Mode,
    line: String,
    pending: VecDeque<Bytes>,
    held: Option<Bytes>,
}

impl MockTransport {
    fn handle_line(&mut self, command: String) {
        self.log.commands.lock().unwrap().push(command.clone());

        let mut reply = format!("{command}\r\n");

        if let Some(late) = self.held.take() {
            self.pending.push_back(late);
        }
        if self.device.delayed.contains(&command) {
            self.pending.push_back(Bytes::from(reply));
            let output = self.device.outputs.get(&command).cloned().unwrap_or_default();
            self.held = Some(Bytes::from(format!(
                "{}\r\n\r\n{}",
                output.replace('\n', "\r\n"),
                self.device.prompt(&self.mode)
            )));
            return;
        }

        if self.device.silent.contains(&command) {
            self.pending.push_back(Bytes::from(reply));
            return;
        }

        if self.device.rejected.contains(&command) {
            reply.push_str("                  ^\r\n  % Unknown command, the error locates at '^'\r\n\r\n");
        } else if let Some(output) = self.device.outputs.get(&command) {
            reply.push_str(&output.replace('\n', "\r\n"));
            reply.push_str("\r\n\r\n");
        } else {
            self.transition(&command);
        }

        reply.push_str(&self.device.prompt(&self.mode));
        self.pending.push_back(Bytes::from(reply));
    }

    fn transition(&mut self, command: &str) {
        let next = match (&self.mode, command) {
            (Mode::User, "enable") => Mode::Privileged,
            (Mode::Privileged, "config") => Mode::Config,
            (Mode::Interface(_), "quit") => Mode::Config,
            (Mode::Config, "quit") => Mode::Privileged,
            (Mode::Config, cmd) if cmd.starts_with("interface gpon 0/") => {
                Mode::Interface(cmd.trim_start_matches("interface gpon 0/").to_string())
            }
            _ => return,
        };
        self.mode = next;
    }
}

impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.is_alive() {
            return Err(TransportError::Disconnected.into());
        }
        for ch in String::from_utf8_lossy(data).chars() {
            if ch == '\n' {
                let command = std::mem::take(&mut self.line);
                self.handle_line(command.trim().to_string());
            } else {
                self.line.push(ch);
            }
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Bytes>> {
        if !self.is_alive() {
            return Ok(None);
        }
        if let Some(chunk) = self.pending.pop_front() {
            return Ok(Some(chunk));
        }
        std::future::pending().await
    }

    fn is_alive(&self) -> bool {
        self.log.alive.load(Ordering::SeqCst)
    }

    async fn close(&mut self) -> Result<()> {
        self.log.alive.store(false, Ordering::SeqCst);
        Ok(())
    }
}
