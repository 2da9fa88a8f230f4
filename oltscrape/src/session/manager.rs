//! Session context manager: one connection plus an explicit modal-state model.

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::context::CliContext;
use super::response::Response;
use crate::channel::{ChannelConfig, CommandChannel, ExecOptions, trailing_line};
use crate::dialect::{Dialect, PromptKind};
use crate::error::{ChannelError, Result, SessionError};
use crate::transport::Connector;

/// Owns one device connection and tracks which CLI context it is in.
///
/// Every transition is confirmed by reading the prompt the device prints
/// afterwards. When a confirmation cannot be read the tracked context falls
/// back to [`CliContext::Config`] rather than keeping a possibly stale
/// interface label, so the next interface command re-enters explicitly.
///
/// Methods take `&mut self`: one command is in flight at a time. Share a
/// session between tasks through [`OltClient`](crate::OltClient).
pub struct SessionContext<C: Connector> {
    /// Dials fresh transports.
    connector: C,

    /// Prompt and command knowledge for the device.
    dialect: Dialect,

    /// Live channel (None when disconnected).
    channel: Option<CommandChannel<C::Transport>>,

    /// Tracked modal context.
    context: CliContext,

    /// Default options for transitions and commands.
    options: ExecOptions,

    /// Settings for each new channel.
    channel_config: ChannelConfig,
}

impl<C: Connector> SessionContext<C> {
    /// Create a disconnected session.
    pub fn new(connector: C, dialect: Dialect) -> Self {
        let channel_config = ChannelConfig {
            pager: dialect.pager.clone(),
            continuation: dialect.continuation.clone(),
            ..ChannelConfig::default()
        };

        Self {
            connector,
            dialect,
            channel: None,
            context: CliContext::Disconnected,
            options: ExecOptions::default(),
            channel_config,
        }
    }

    /// Set the default execution options.
    pub fn with_options(mut self, options: ExecOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the pause between typing a command and pressing Enter.
    pub fn with_keystroke_delay(mut self, delay: Duration) -> Self {
        self.channel_config.keystroke_delay = delay;
        self
    }

    /// The tracked CLI context.
    pub fn context(&self) -> &CliContext {
        &self.context
    }

    /// The dialect in use.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Default execution options.
    pub fn options(&self) -> &ExecOptions {
        &self.options
    }

    /// Whether a live connection exists.
    pub fn is_alive(&self) -> bool {
        self.channel.as_ref().is_some_and(|c| c.is_alive())
    }

    /// Connect and reach configuration mode.
    ///
    /// No-op when already connected and alive. A dead or half-initialized
    /// connection is discarded and redialed.
    pub async fn connect(&mut self) -> Result<()> {
        if self.context.is_ready() && self.is_alive() {
            return Ok(());
        }

        if let Some(stale) = self.channel.take() {
            warn!("connection to {} lost, reconnecting", self.connector.target());
            if let Err(e) = stale.close().await {
                debug!("closing stale connection failed: {}", e);
            }
        }
        self.context = CliContext::Disconnected;

        if let Err(e) = self.open().await {
            if let Some(channel) = self.channel.take() {
                if let Err(close_err) = channel.close().await {
                    debug!("closing half-open connection failed: {}", close_err);
                }
            }
            self.context = CliContext::Disconnected;
            return Err(e);
        }

        info!("connected to {} ({})", self.connector.target(), self.context);
        Ok(())
    }

    /// Dial, elevate, enter configuration mode and prepare the terminal.
    async fn open(&mut self) -> Result<()> {
        let transport = self.connector.connect().await?;
        let mut channel = CommandChannel::new(transport, self.channel_config.clone());

        let banner = channel
            .read_until(&self.dialect.any_prompt, self.options.timeout)
            .await?;
        self.channel = Some(channel);
        self.context = CliContext::Global;

        let landed = self.dialect.classify(trailing_line(&banner));
        debug!("initial prompt: {:?}", landed);

        if landed == Some(PromptKind::User) {
            let elevate = self.dialect.elevate_command.clone();
            self.transition(&elevate, &PromptKind::Privileged).await?;
        }

        let config = self.dialect.config_command.clone();
        self.transition(&config, &PromptKind::Config).await?;
        self.context = CliContext::Config;

        for command in self.dialect.on_open_commands.clone() {
            self.execute_in_context(&command).await?;
        }

        Ok(())
    }

    /// Send a context-changing command and confirm the prompt it lands on.
    ///
    /// Does not touch the tracked context; callers decide what to record.
    async fn transition(&mut self, command: &str, expected: &PromptKind) -> Result<()> {
        let options = self.options;
        let channel = self.channel.as_mut().ok_or(SessionError::NotConnected)?;

        let output = match channel.execute(command, &self.dialect.any_prompt, &options).await {
            Ok(output) => output,
            Err(e) => {
                self.invalidate();
                return Err(e);
            }
        };
        let prompt = trailing_line(&output);

        match self.dialect.classify(prompt) {
            Some(ref reached) if reached == expected => {
                debug!("{:?} -> {}", command, reached);
                Ok(())
            }
            _ => Err(SessionError::TransitionUnconfirmed {
                command: command.to_string(),
                expected: expected.to_string(),
                prompt: prompt.to_string(),
            }
            .into()),
        }
    }

    /// Enter the GPON interface of `board`.
    ///
    /// No-op if that interface is already open. From another interface the
    /// session exits to configuration mode first.
    pub async fn enter_interface(&mut self, board: &str) -> Result<()> {
        self.connect().await?;

        match &self.context {
            CliContext::Interface(current) if current == board => {
                debug!("already in interface {}", board);
                return Ok(());
            }
            CliContext::Interface(_) => self.exit_interface().await?,
            _ => {}
        }

        let command = self.dialect.interface_command(board);
        match self
            .transition(&command, &PromptKind::Interface(board.to_string()))
            .await
        {
            Ok(()) => {
                self.context = CliContext::Interface(board.to_string());
                Ok(())
            }
            Err(e) => {
                self.anchor_at_config();
                Err(e)
            }
        }
    }

    /// Leave the current interface for configuration mode.
    ///
    /// No-op outside an interface. The tracked context becomes
    /// [`CliContext::Config`] even when the exit cannot be confirmed.
    pub async fn exit_interface(&mut self) -> Result<()> {
        let CliContext::Interface(board) = &self.context else {
            return Ok(());
        };
        let board = board.clone();

        let command = self.dialect.exit_interface_command.clone();
        let result = self.transition(&command, &PromptKind::Config).await;
        self.anchor_at_config();

        if let Err(e) = &result {
            warn!("exit from interface {} unconfirmed: {}", board, e);
        }
        result
    }

    /// Make sure the session is in global configuration mode.
    pub async fn ensure_config_mode(&mut self) -> Result<()> {
        self.connect().await?;
        if matches!(self.context, CliContext::Interface(_)) {
            self.exit_interface().await?;
        }
        Ok(())
    }

    /// Run a command in the current context with default options.
    pub async fn execute_in_context(&mut self, command: &str) -> Result<Response> {
        let options = self.options;
        self.execute_in_context_with(command, &options).await
    }

    /// Run a command in the current context.
    ///
    /// Reads until the prompt of the tracked context. Never changes the
    /// tracked context.
    pub async fn execute_in_context_with(
        &mut self,
        command: &str,
        options: &ExecOptions,
    ) -> Result<Response> {
        let terminator = match &self.context {
            CliContext::Disconnected => return Err(SessionError::NotConnected.into()),
            CliContext::Global => self.dialect.any_prompt.clone(),
            CliContext::Config => self.dialect.config_prompt.regex().clone(),
            CliContext::Interface(board) => self
                .dialect
                .interface_prompt(board)
                .map_err(ChannelError::from)?,
        };
        let channel = self.channel.as_mut().ok_or(SessionError::NotConnected)?;

        let start = Instant::now();
        let raw = match channel.execute(command, &terminator, options).await {
            Ok(raw) => raw,
            Err(e) => {
                // the device may still be answering; its late output would
                // be read as the reply to the next command
                self.invalidate();
                return Err(e);
            }
        };
        let elapsed = start.elapsed();

        let prompt = trailing_line(&raw).to_string();
        let result = self.dialect.normalize_output(&raw, command);
        debug!(
            "{:?} in {} returned {} bytes in {:?}",
            command,
            self.context,
            result.len(),
            elapsed
        );

        let response = Response::new(command, result, raw, prompt, elapsed);
        match self.dialect.detect_failure(&response.result) {
            Some(marker) => Ok(response.with_failure(marker)),
            None => Ok(response),
        }
    }

    /// Run a command that is only valid outside any interface.
    pub async fn execute_global_command(&mut self, command: &str) -> Result<Response> {
        let options = self.options;
        self.execute_global_command_with(command, &options).await
    }

    /// Run a command from configuration mode with explicit options.
    pub async fn execute_global_command_with(
        &mut self,
        command: &str,
        options: &ExecOptions,
    ) -> Result<Response> {
        self.ensure_config_mode().await?;
        self.execute_in_context_with(command, options).await
    }

    /// Close the connection.
    ///
    /// An open interface is exited first on a best-effort basis. The
    /// session always ends up [`CliContext::Disconnected`].
    pub async fn disconnect(&mut self) -> Result<()> {
        if matches!(self.context, CliContext::Interface(_)) && self.is_alive() {
            if let Err(e) = self.exit_interface().await {
                warn!("courtesy exit before disconnect failed: {}", e);
            }
        }

        self.context = CliContext::Disconnected;
        match self.channel.take() {
            Some(channel) => channel.close().await,
            None => Ok(()),
        }
    }

    /// Fall back to configuration mode unless the connection was dropped.
    fn anchor_at_config(&mut self) {
        if self.channel.is_some() {
            self.context = CliContext::Config;
        }
    }

    /// Drop the connection without sending anything.
    ///
    /// Used when a command failed or was cancelled mid-flight and the CLI
    /// cursor can no longer be trusted.
    pub fn invalidate(&mut self) {
        if self.channel.take().is_some() {
            warn!("discarding connection to {}", self.connector.target());
        }
        self.context = CliContext::Disconnected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::huawei;
    use crate::error::{Error, TransportError};
    use crate::transport::mock::{DeviceLog, MockConnector, MockDevice};
    use tokio_test::{assert_err, assert_ok};

    fn session_with(
        device: MockDevice,
        timeout: Duration,
    ) -> (SessionContext<MockConnector>, DeviceLog) {
        let connector = MockConnector::new(device);
        let log = connector.log();
        let session = SessionContext::new(connector, huawei::smartax())
            .with_options(ExecOptions::new(timeout, 1.0))
            .with_keystroke_delay(Duration::ZERO);
        (session, log)
    }

    fn session(device: MockDevice) -> (SessionContext<MockConnector>, DeviceLog) {
        session_with(device, Duration::from_millis(500))
    }

    #[tokio::test]
    async fn test_connect_reaches_config() {
        let (mut session, log) = session(MockDevice::new("MA5800-X7"));
        assert_eq!(session.context(), &CliContext::Disconnected);

        assert_ok!(session.connect().await);

        assert_eq!(session.context(), &CliContext::Config);
        assert_eq!(log.commands(), vec!["enable", "config", "undo smart", "scroll"]);
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let (mut session, log) = session(MockDevice::new("MA5800-X7"));

        assert_ok!(session.connect().await);
        assert_ok!(session.connect().await);

        assert_eq!(log.connects(), 1);
        assert_eq!(log.count("enable"), 1);
    }

    #[tokio::test]
    async fn test_reconnect_when_connection_dies() {
        let (mut session, log) = session(MockDevice::new("MA5800-X7"));
        assert_ok!(session.connect().await);
        session.enter_interface("2").await.unwrap();

        log.kill();
        assert!(!session.is_alive());

        assert_ok!(session.connect().await);
        assert_eq!(log.connects(), 2);
        assert_eq!(session.context(), &CliContext::Config);
    }

    #[tokio::test]
    async fn test_connect_failure_leaves_disconnected() {
        let (mut session, _log) = session(MockDevice::new("MA5800-X7").refusing_connections());

        let err = assert_err!(session.connect().await);

        assert!(matches!(err, Error::Transport(TransportError::Disconnected)));
        assert_eq!(session.context(), &CliContext::Disconnected);
    }

    #[tokio::test]
    async fn test_unconfirmed_config_entry_tears_down() {
        let (mut session, log) = session(MockDevice::new("MA5800-X7").rejecting("config"));

        let err = assert_err!(session.connect().await);

        assert!(matches!(
            err,
            Error::Session(SessionError::TransitionUnconfirmed { .. })
        ));
        assert_eq!(session.context(), &CliContext::Disconnected);
        assert!(!session.is_alive());
        assert_eq!(log.commands(), vec!["enable", "config"]);
    }

    #[tokio::test]
    async fn test_enter_same_interface_twice_sends_once() {
        let (mut session, log) = session(MockDevice::new("MA5800-X7"));

        assert_ok!(session.enter_interface("4").await);
        assert_ok!(session.enter_interface("4").await);

        assert_eq!(log.count("interface gpon 0/4"), 1);
        assert_eq!(session.context(), &CliContext::Interface("4".into()));
    }

    #[tokio::test]
    async fn test_switch_interface_exits_once_then_enters_once() {
        let (mut session, log) = session(MockDevice::new("MA5800-X7"));
        assert_ok!(session.enter_interface("4").await);
        log.clear();

        assert_ok!(session.enter_interface("5").await);

        assert_eq!(log.commands(), vec!["quit", "interface gpon 0/5"]);
        assert_eq!(session.context(), &CliContext::Interface("5".into()));
    }

    #[tokio::test]
    async fn test_rejected_interface_anchors_config() {
        let (mut session, _log) =
            session(MockDevice::new("MA5800-X7").rejecting("interface gpon 0/9"));

        let err = assert_err!(session.enter_interface("9").await);

        assert!(matches!(
            err,
            Error::Session(SessionError::TransitionUnconfirmed { .. })
        ));
        assert_eq!(session.context(), &CliContext::Config);
    }

    #[tokio::test]
    async fn test_unconfirmed_exit_anchors_config() {
        let (mut session, _log) = session(MockDevice::new("MA5800-X7").rejecting("quit"));
        assert_ok!(session.enter_interface("4").await);

        let err = assert_err!(session.exit_interface().await);

        assert!(matches!(
            err,
            Error::Session(SessionError::TransitionUnconfirmed { .. })
        ));
        assert_eq!(session.context(), &CliContext::Config);
    }

    #[tokio::test]
    async fn test_exit_timeout_drops_connection() {
        let (mut session, _log) = session_with(
            MockDevice::new("MA5800-X7").silent("quit"),
            Duration::from_millis(100),
        );
        assert_ok!(session.enter_interface("4").await);

        let err = assert_err!(session.exit_interface().await);

        assert!(err.is_timeout());
        assert_eq!(session.context(), &CliContext::Disconnected);
        assert!(!session.is_alive());
    }

    #[tokio::test]
    async fn test_late_output_is_not_read_as_next_reply() {
        let device = MockDevice::new("MA5800-X7")
            .with_output("display ont autofind all", "  Number : 1")
            .delayed("display ont autofind all")
            .with_output("display time", "  2024-02-20 10:11:12+08:00");
        let (mut session, log) = session_with(device, Duration::from_millis(100));

        let err = assert_err!(session.execute_global_command("display ont autofind all").await);
        assert!(err.is_timeout());
        assert_eq!(session.context(), &CliContext::Disconnected);

        let response = session.execute_global_command("display time").await.unwrap();

        assert_eq!(response.result, "  2024-02-20 10:11:12+08:00");
        assert_eq!(log.connects(), 2);
        assert_eq!(session.context(), &CliContext::Config);
    }

    #[tokio::test]
    async fn test_exit_outside_interface_is_noop() {
        let (mut session, log) = session(MockDevice::new("MA5800-X7"));
        assert_ok!(session.connect().await);
        log.clear();

        assert_ok!(session.exit_interface().await);

        assert!(log.commands().is_empty());
    }

    #[tokio::test]
    async fn test_execute_requires_connection() {
        let (mut session, log) = session(MockDevice::new("MA5800-X7"));

        let err = assert_err!(session.execute_in_context("display time").await);

        assert!(matches!(err, Error::Session(SessionError::NotConnected)));
        assert_eq!(log.connects(), 0);
    }

    #[tokio::test]
    async fn test_execute_in_context_keeps_state_and_normalizes() {
        let device = MockDevice::new("MA5800-X7")
            .with_output("display ont info summary 0", "  ONT  Run     Last\n  0    online  -");
        let (mut session, _log) = session(device);
        assert_ok!(session.enter_interface("2").await);

        let response = session
            .execute_in_context("display ont info summary 0")
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.result, "  ONT  Run     Last\n  0    online  -");
        assert_eq!(response.prompt, "MA5800-X7(config-if-gpon-0/2)#");
        assert_eq!(session.context(), &CliContext::Interface("2".into()));
    }

    #[tokio::test]
    async fn test_rejected_command_is_flagged() {
        let (mut session, _log) = session(MockDevice::new("MA5800-X7").rejecting("dispaly board 0/2"));
        assert_ok!(session.connect().await);

        let response = session.execute_in_context("dispaly board 0/2").await.unwrap();

        assert!(!response.is_success());
        assert_eq!(response.failure_message.as_deref(), Some("% Unknown command"));
    }

    #[tokio::test]
    async fn test_global_command_leaves_interface_first() {
        let (mut session, log) = session(MockDevice::new("MA5800-X7"));
        assert_ok!(session.enter_interface("4").await);
        log.clear();

        assert_ok!(session.execute_global_command("display ont autofind all").await);

        assert_eq!(log.commands(), vec!["quit", "display ont autofind all"]);
        assert_eq!(session.context(), &CliContext::Config);
    }

    #[tokio::test]
    async fn test_disconnect_exits_interface() {
        let (mut session, log) = session(MockDevice::new("MA5800-X7"));
        assert_ok!(session.enter_interface("4").await);
        log.clear();

        assert_ok!(session.disconnect().await);

        assert_eq!(log.commands(), vec!["quit"]);
        assert_eq!(session.context(), &CliContext::Disconnected);
        assert!(!session.is_alive());
    }

    #[tokio::test]
    async fn test_disconnect_survives_failed_exit() {
        let (mut session, _log) = session_with(
            MockDevice::new("MA5800-X7").silent("quit"),
            Duration::from_millis(100),
        );
        assert_ok!(session.enter_interface("4").await);

        assert_ok!(session.disconnect().await);

        assert_eq!(session.context(), &CliContext::Disconnected);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reconnect() {
        let (mut session, log) = session(MockDevice::new("MA5800-X7"));
        assert_ok!(session.connect().await);

        session.invalidate();
        assert_eq!(session.context(), &CliContext::Disconnected);

        assert_ok!(session.ensure_config_mode().await);
        assert_eq!(log.connects(), 2);
    }
}
