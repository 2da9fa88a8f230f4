//! Builder for creating OLT sessions.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::manager::SessionContext;
use crate::channel::ExecOptions;
use crate::dialect::Dialect;
use crate::error::{ConfigError, Result};
use crate::transport::{AuthMethod, HostKeyVerification, SshConfig, SshConnector};

/// Builder for constructing [`SessionContext`]s over SSH.
///
/// # Example
///
/// ```rust,no_run
/// use oltscrape::SessionBuilder;
///
/// # async fn example() -> Result<(), oltscrape::Error> {
/// let mut session = SessionBuilder::new("10.120.6.105")
///     .username("admin")
///     .password("secret")
///     .build()?;
/// session.connect().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: AuthMethod,
    timeout: Duration,
    delay_factor: f64,
    keystroke_delay: Duration,
    terminal_width: u32,
    terminal_height: u32,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    dialect: Dialect,
}

impl SessionBuilder {
    /// Create a new session builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: AuthMethod::None,
            timeout: Duration::from_secs(20),
            delay_factor: 1.0,
            keystroke_delay: Duration::from_millis(100),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
            dialect: Dialect::default(),
        }
    }

    /// Build from `OLT_*` environment variables.
    ///
    /// `OLT_HOST` and `OLT_USERNAME` are required. `OLT_PORT`,
    /// `OLT_PASSWORD`, `OLT_TIMEOUT_SECS` and `OLT_DELAY_FACTOR` are
    /// optional.
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup using the `OLT_*` names.
    pub fn from_vars<F>(lookup: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("OLT_HOST")
            .filter(|h| !h.trim().is_empty())
            .ok_or(ConfigError::MissingField("OLT_HOST"))?;
        let username = lookup("OLT_USERNAME").ok_or(ConfigError::MissingField("OLT_USERNAME"))?;

        let mut builder = Self::new(host.trim()).username(username);

        if let Some(port) = lookup("OLT_PORT") {
            let port = port
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue {
                    field: "OLT_PORT",
                    value: port.clone(),
                })?;
            builder = builder.port(port);
        }

        if let Some(password) = lookup("OLT_PASSWORD") {
            builder = builder.password(password);
        }

        if let Some(secs) = lookup("OLT_TIMEOUT_SECS") {
            let parsed = secs
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    field: "OLT_TIMEOUT_SECS",
                    value: secs.clone(),
                })?;
            builder = builder.timeout(Duration::from_secs(parsed));
        }

        if let Some(factor) = lookup("OLT_DELAY_FACTOR") {
            let parsed = factor
                .trim()
                .parse::<f64>()
                .map_err(|_| ConfigError::InvalidValue {
                    field: "OLT_DELAY_FACTOR",
                    value: factor.clone(),
                })?;
            builder = builder.delay_factor(parsed);
        }

        Ok(builder)
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Password(SecretString::from(password.into()));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        };
        self
    }

    /// Set private key authentication with passphrase.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: Some(SecretString::from(passphrase.into())),
        };
        self
    }

    /// Set the connection and default command timeout (default: 20s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the default delay factor (default: 1.0).
    pub fn delay_factor(mut self, delay_factor: f64) -> Self {
        self.delay_factor = delay_factor;
        self
    }

    /// Set the unscaled pause between typing a command and pressing Enter.
    pub fn keystroke_delay(mut self, delay: Duration) -> Self {
        self.keystroke_delay = delay;
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a known_hosts file other than `~/.ssh/known_hosts`.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Use a custom dialect.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Build the session.
    ///
    /// This validates the settings but does not connect. The session
    /// connects lazily on first use, or explicitly via `connect()`.
    pub fn build(self) -> Result<SessionContext<SshConnector>> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingField("host").into());
        }

        let username = self.username.ok_or(ConfigError::MissingField("username"))?;

        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "timeout",
                value: format!("{:?}", self.timeout),
            }
            .into());
        }

        if !self.delay_factor.is_finite() || self.delay_factor < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "delay_factor",
                value: self.delay_factor.to_string(),
            }
            .into());
        }

        let ssh_config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            auth: self.auth,
            timeout: self.timeout,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        Ok(SessionContext::new(SshConnector::new(ssh_config), self.dialect)
            .with_options(ExecOptions::new(self.timeout, self.delay_factor))
            .with_keystroke_delay(self.keystroke_delay))
    }
}
