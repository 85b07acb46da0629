//! Connection parameters supplied by the operator.
//!
//! A [`ConnectionConfig`] is built from the connection form, validated before
//! any network call, rendered into a `redis://` / `rediss://` descriptor and
//! translated into a `fred` client configuration.

use std::fmt;

use fred::prelude::{Config, Server, ServerConfig};
use serde::{Deserialize, Serialize};

use super::valkey_client::ValkeyError;

/// Port used when the form leaves the field untouched.
pub const DEFAULT_PORT: &str = "6379";

/// URL scheme for plaintext connections.
pub const PLAIN_SCHEME: &str = "redis";
/// URL scheme for TLS connections.
pub const SECURE_SCHEME: &str = "rediss";

/// Characters that would break the `host:port` segment of the descriptor.
const FORBIDDEN_HOST_CHARS: &[char] = &['/', '@', '?', '#'];

fn default_port() -> String {
    DEFAULT_PORT.to_string()
}

fn default_use_tls() -> bool {
    true
}

/// Connection parameters for a single Valkey/Redis server.
///
/// Field names on the wire match the browser form record (`useTLS`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(rename = "useTLS", default = "default_use_tls")]
    pub use_tls: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            username: None,
            password: None,
            use_tls: default_use_tls(),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("use_tls", &self.use_tls)
            .finish()
    }
}

impl ConnectionConfig {
    /// Create a plaintext configuration for `host:port`.
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            use_tls: false,
            ..Default::default()
        }
    }

    /// Set the ACL username.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Enable or disable TLS.
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Username, treating an empty form field as absent.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|u| !u.is_empty())
    }

    /// Password, treating an empty form field as absent.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// Copy of this configuration without the password.
    pub fn without_password(&self) -> Self {
        Self {
            password: None,
            ..self.clone()
        }
    }

    /// Parse the port field into a TCP port.
    pub fn port_number(&self) -> Result<u16, ValkeyError> {
        let raw = self.port.trim();
        match raw.parse::<u16>() {
            Ok(0) | Err(_) => Err(ValkeyError::InvalidConfig(format!(
                "port must be an integer between 1 and 65535, got '{}'",
                raw
            ))),
            Ok(port) => Ok(port),
        }
    }

    /// Check the configuration before any connection attempt.
    pub fn validate(&self) -> Result<(), ValkeyError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ValkeyError::InvalidConfig("host is required".to_string()));
        }
        if host.chars().any(char::is_whitespace) || host.contains(FORBIDDEN_HOST_CHARS) {
            return Err(ValkeyError::InvalidConfig(format!(
                "host '{}' contains characters that are not allowed",
                host
            )));
        }
        self.port_number()?;
        Ok(())
    }

    /// URL scheme selected by the TLS flag.
    pub fn scheme(&self) -> &'static str {
        if self.use_tls {
            SECURE_SCHEME
        } else {
            PLAIN_SCHEME
        }
    }

    /// Render the connection descriptor `scheme://[user:pass@]host:port`.
    ///
    /// Credentials are only emitted when a username is present. They are
    /// percent-encoded so that the descriptor stays parseable.
    pub fn connection_url(&self) -> String {
        let credentials = self.username().map(|user| {
            format!(
                "{}:{}@",
                urlencoding::encode(user),
                urlencoding::encode(self.password().unwrap_or_default())
            )
        });
        self.render_url(credentials.as_deref().unwrap_or_default())
    }

    /// Descriptor with the password masked, for logs and error messages.
    pub fn redacted_url(&self) -> String {
        let credentials = self
            .username()
            .map(|user| format!("{}:***@", urlencoding::encode(user)));
        self.render_url(credentials.as_deref().unwrap_or_default())
    }

    fn render_url(&self, credentials: &str) -> String {
        let host = self.host.trim();
        // IPv6 literals need brackets to keep the port separator unambiguous
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{}]", host)
        } else {
            host.to_string()
        };
        format!(
            "{}://{}{}:{}",
            self.scheme(),
            credentials,
            host,
            self.port.trim()
        )
    }

    /// Build the `fred` configuration for a single (non-clustered) server.
    ///
    /// TLS is attached separately by the connector, which owns the trust roots.
    pub fn to_client_config(&self) -> Result<Config, ValkeyError> {
        self.validate()?;
        let host = self.host.trim().trim_start_matches('[').trim_end_matches(']');

        Ok(Config {
            server: ServerConfig::Centralized {
                server: Server::new(host, self.port_number()?),
            },
            username: self.username().map(str::to_string),
            password: self.password().map(str::to_string),
            ..Default::default()
        })
    }
}
