//! Process configuration read from the environment.
//!
//! Every setting has a default so the console starts with no environment at
//! all. Unparseable values are rejected at startup rather than silently
//! replaced.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::client::{MAX_SCAN_COUNT, ValkeyClientConfig};
use crate::console::ConsoleSettings;

pub const ENV_LISTEN_ADDR: &str = "CONSOLE_LISTEN_ADDR";
pub const ENV_STATE_PATH: &str = "CONSOLE_STATE_PATH";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "CONSOLE_CONNECT_TIMEOUT_SECS";
pub const ENV_COMMAND_TIMEOUT_SECS: &str = "CONSOLE_COMMAND_TIMEOUT_SECS";
pub const ENV_OPERATION_TIMEOUT_SECS: &str = "CONSOLE_OPERATION_TIMEOUT_SECS";
pub const ENV_SCAN_COUNT: &str = "CONSOLE_SCAN_COUNT";
pub const ENV_MAX_KEYS: &str = "CONSOLE_MAX_KEYS";
pub const ENV_PERSIST_PASSWORD: &str = "CONSOLE_PERSIST_PASSWORD";
pub const ENV_TLS_CA_PATH: &str = "CONSOLE_TLS_CA_PATH";

const DEFAULT_STATE_PATH: &str = "valkey-console.json";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SCAN_COUNT: u32 = 100;
const DEFAULT_MAX_KEYS: usize = 10_000;

/// Errors in the process configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error("{name} must be {requirement}")]
    OutOfRange {
        name: &'static str,
        requirement: &'static str,
    },
}

/// Console process configuration
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub listen_addr: SocketAddr,
    /// File holding the saved connection configuration
    pub state_path: PathBuf,
    /// Timeout for establishing a store connection
    pub connect_timeout: Duration,
    /// Timeout for a single store command
    pub command_timeout: Duration,
    /// Deadline for a whole console operation
    pub operation_timeout: Duration,
    /// `COUNT` hint for key listing
    pub scan_count: u32,
    /// Ceiling on keys returned by a full listing
    pub max_keys: usize,
    /// Whether the saved configuration keeps the password
    pub persist_password: bool,
    /// Optional PEM bundle of trust roots for TLS connections
    pub tls_ca_path: Option<PathBuf>,
}

impl AppConfig {
    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let listen_addr = parse_or(&lookup, ENV_LISTEN_ADDR, || {
            SocketAddr::from(([0, 0, 0, 0], 8080))
        })?;
        let state_path = lookup(ENV_STATE_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH));
        let connect_timeout = Duration::from_secs(parse_or(&lookup, ENV_CONNECT_TIMEOUT_SECS, || {
            DEFAULT_CONNECT_TIMEOUT_SECS
        })?);
        let command_timeout = Duration::from_secs(parse_or(&lookup, ENV_COMMAND_TIMEOUT_SECS, || {
            DEFAULT_COMMAND_TIMEOUT_SECS
        })?);
        // Leave room for connect, one command and QUIT by default
        let operation_timeout =
            Duration::from_secs(parse_or(&lookup, ENV_OPERATION_TIMEOUT_SECS, || {
                connect_timeout.as_secs() + command_timeout.as_secs() + 5
            })?);
        let scan_count = parse_or(&lookup, ENV_SCAN_COUNT, || DEFAULT_SCAN_COUNT)?;
        let max_keys = parse_or(&lookup, ENV_MAX_KEYS, || DEFAULT_MAX_KEYS)?;
        let persist_password = parse_bool(&lookup, ENV_PERSIST_PASSWORD)?;
        let tls_ca_path = lookup(ENV_TLS_CA_PATH).map(PathBuf::from);

        let config = Self {
            listen_addr,
            state_path,
            connect_timeout,
            command_timeout,
            operation_timeout,
            scan_count,
            max_keys,
            persist_password,
            tls_ca_path,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::OutOfRange {
                name: ENV_CONNECT_TIMEOUT_SECS,
                requirement: "at least 1 second",
            });
        }
        if self.command_timeout.is_zero() {
            return Err(ConfigError::OutOfRange {
                name: ENV_COMMAND_TIMEOUT_SECS,
                requirement: "at least 1 second",
            });
        }
        if self.operation_timeout.is_zero() {
            return Err(ConfigError::OutOfRange {
                name: ENV_OPERATION_TIMEOUT_SECS,
                requirement: "at least 1 second",
            });
        }
        // A deadline shorter than the handshake would cancel every slow connect
        if self.operation_timeout < self.connect_timeout {
            return Err(ConfigError::OutOfRange {
                name: ENV_OPERATION_TIMEOUT_SECS,
                requirement: "at least the connect timeout",
            });
        }
        if self.scan_count == 0 || self.scan_count > MAX_SCAN_COUNT {
            return Err(ConfigError::OutOfRange {
                name: ENV_SCAN_COUNT,
                requirement: "between 1 and 1000",
            });
        }
        if self.max_keys == 0 {
            return Err(ConfigError::OutOfRange {
                name: ENV_MAX_KEYS,
                requirement: "at least 1",
            });
        }
        Ok(())
    }

    /// Client settings derived from this configuration (without the CA bundle,
    /// which is read asynchronously at startup)
    pub fn client_config(&self) -> ValkeyClientConfig {
        ValkeyClientConfig::default()
            .with_connection_timeout(self.connect_timeout)
            .with_command_timeout(self.command_timeout)
    }

    /// Console settings derived from this configuration
    pub fn console_settings(&self) -> ConsoleSettings {
        ConsoleSettings {
            operation_timeout: self.operation_timeout,
            scan_count: self.scan_count,
            max_keys: self.max_keys,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        // The empty lookup only produces defaults, which always validate
        Self::from_lookup(|_| None).unwrap_or_else(|_| Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            operation_timeout: Duration::from_secs(
                DEFAULT_CONNECT_TIMEOUT_SECS + DEFAULT_COMMAND_TIMEOUT_SECS + 5,
            ),
            scan_count: DEFAULT_SCAN_COUNT,
            max_keys: DEFAULT_MAX_KEYS,
            persist_password: false,
            tls_ca_path: None,
        })
    }
}

fn parse_or<T, L, D>(lookup: &L, name: &'static str, default: D) -> Result<T, ConfigError>
where
    T: FromStr,
    L: Fn(&str) -> Option<String>,
    D: FnOnce() -> T,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw.clone(),
        }),
        None => {
            debug!(name, "Using default");
            Ok(default())
        }
    }
}

fn parse_bool<L>(lookup: &L, name: &'static str) -> Result<bool, ConfigError>
where
    L: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(false),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value: raw }),
        },
    }
}
