//! Valkey client wrapper using the fred crate.
//!
//! Provides a short-lived, single-server client with TLS support and bounded
//! connect/command timeouts. Each [`ValkeyClient`] is one network session; the
//! [`ValkeyConnector`] creates a fresh one for every console operation.

use std::time::Duration;

use async_trait::async_trait;
use fred::cmd;
use fred::prelude::*;
use fred::types::Value;
use rustls::{ClientConfig, RootCertStore};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{Instrument, debug, instrument, warn};

use super::connection::ConnectionConfig;
use super::parsing::{lossy_string, parse_scan_reply};
use super::session::{Connector, Session};
use super::types::{KeyPage, ParseError, ScanRequest};

/// Errors that can occur during Valkey operations.
#[derive(Error, Debug)]
pub enum ValkeyError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Redis error: {0}")]
    Redis(#[from] fred::error::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Client settings shared by every connection the console opens.
#[derive(Clone, Debug)]
pub struct ValkeyClientConfig {
    /// Connection timeout.
    pub connection_timeout: Duration,
    /// Command timeout.
    pub command_timeout: Duration,
    /// PEM bundle of additional trust roots for TLS connections.
    pub ca_cert_pem: Option<Vec<u8>>,
}

impl Default for ValkeyClientConfig {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(30),
            ca_cert_pem: None,
        }
    }
}

impl ValkeyClientConfig {
    /// Set connection timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set command timeout.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Trust the certificates in this PEM bundle instead of the system roots.
    pub fn with_ca_cert_pem(mut self, pem: Vec<u8>) -> Self {
        self.ca_cert_pem = Some(pem);
        self
    }
}

/// Valkey client for a single console operation.
pub struct ValkeyClient {
    client: Client,
}

impl ValkeyClient {
    /// Create and connect a new client for a single server.
    #[instrument(skip_all, fields(target = %config.redacted_url()))]
    pub async fn connect(
        config: &ConnectionConfig,
        settings: &ValkeyClientConfig,
    ) -> Result<Self, ValkeyError> {
        let mut redis_config = config.to_client_config()?;

        if config.use_tls {
            let tls_connector = build_tls_connector(settings.ca_cert_pem.as_deref())?;
            redis_config.tls = Some(tls_connector.into());
        }

        let command_timeout = settings.command_timeout;
        let connection_timeout = settings.connection_timeout;

        // No reconnect policy: a refused or failed connection surfaces immediately
        let client = Builder::from_config(redis_config)
            .with_performance_config(|perf| {
                perf.default_command_timeout = command_timeout;
            })
            .with_connection_config(|conn| {
                conn.connection_timeout = connection_timeout;
            })
            .build()?;

        // The handshake runs in its own task so that a caller dropping this
        // future (deadline or disconnect) cannot orphan fred's router task.
        // Whichever side drops the guard while still armed releases the client.
        let (tx, rx) = oneshot::channel();
        let guard = ConnectGuard::new(client);
        let handshake = async move {
            debug!("Connecting to Valkey");
            let result = guard.client().init().await;
            match result {
                Ok(_) => {
                    if tx.send(Ok(guard)).is_err() {
                        debug!("Connect abandoned by caller, releasing connection");
                    }
                }
                Err(e) => {
                    drop(guard);
                    let _ = tx.send(Err(e));
                }
            }
        };
        tokio::spawn(handshake.in_current_span());

        match rx.await {
            Ok(Ok(guard)) => {
                debug!("Connected to Valkey");
                Ok(Self {
                    client: guard.disarm(),
                })
            }
            Ok(Err(e)) => Err(ValkeyError::Connection(e.to_string())),
            Err(_) => Err(ValkeyError::Connection(
                "connection task ended before the handshake finished".to_string(),
            )),
        }
    }
}

/// Owns a client whose handshake has not been handed to a caller yet.
///
/// Dropping the guard while it still holds the client sends `QUIT` from a
/// background task.
struct ConnectGuard {
    client: Client,
    armed: bool,
}

impl ConnectGuard {
    fn new(client: Client) -> Self {
        Self {
            client,
            armed: true,
        }
    }

    fn client(&self) -> &Client {
        &self.client
    }

    fn disarm(mut self) -> Client {
        self.armed = false;
        self.client.clone()
    }
}

impl Drop for ConnectGuard {
    fn drop(&mut self) {
        if self.armed {
            quit_in_background(self.client.clone());
        }
    }
}

/// Send `QUIT` on a spawned task; used wherever the caller cannot await.
fn quit_in_background(client: Client) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(e) = client.quit().await {
                    debug!(error = %e, "Background QUIT failed");
                }
            });
        }
        Err(_) => warn!("No async runtime available to release Valkey connection"),
    }
}

#[async_trait]
impl Session for ValkeyClient {
    #[instrument(skip(self))]
    async fn ping(&self) -> Result<String, ValkeyError> {
        let response: String = self.client.ping(None).await?;
        Ok(response)
    }

    #[instrument(skip(self), fields(cursor = %request.cursor, count = request.count))]
    async fn scan(&self, request: &ScanRequest) -> Result<KeyPage, ValkeyError> {
        // SCAN is issued directly so the caller keeps control of the cursor
        let args = vec![
            request.cursor.clone(),
            "MATCH".to_string(),
            request.pattern.clone(),
            "COUNT".to_string(),
            request.count.to_string(),
        ];
        let reply: Value = self.client.custom(cmd!("SCAN"), args).await?;
        Ok(parse_scan_reply(reply)?)
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, ValkeyError> {
        // Values are binary-safe; undecodable bytes are shown as U+FFFD
        let value: Value = self.client.get(key).await?;
        Ok(lossy_string(value))
    }

    #[instrument(skip(self, value), fields(value_len = value.len()))]
    async fn set(&self, key: &str, value: &str) -> Result<(), ValkeyError> {
        let _: () = self.client.set(key, value, None, None, false).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<u64, ValkeyError> {
        let removed: u64 = self.client.del(key).await?;
        Ok(removed)
    }

    async fn close(&self) -> Result<(), ValkeyError> {
        self.client.quit().await?;
        Ok(())
    }

    fn close_detached(&self) {
        quit_in_background(self.client.clone());
    }
}

/// [`Connector`] that opens a fresh [`ValkeyClient`] per operation.
#[derive(Clone, Debug, Default)]
pub struct ValkeyConnector {
    settings: ValkeyClientConfig,
}

impl ValkeyConnector {
    pub fn new(settings: ValkeyClientConfig) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Connector for ValkeyConnector {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Session>, ValkeyError> {
        let client = ValkeyClient::connect(config, &self.settings).await?;
        Ok(Box::new(client))
    }
}

/// Build a TLS connector.
///
/// Without a CA bundle the platform trust store is used. With one, only the
/// certificates in the bundle are trusted and the server name is verified
/// against the configured host.
fn build_tls_connector(ca_cert_pem: Option<&[u8]>) -> Result<TlsConnector, ValkeyError> {
    let Some(pem) = ca_cert_pem else {
        return TlsConnector::default_rustls()
            .map_err(|e| ValkeyError::Connection(format!("TLS error: {}", e)));
    };

    let mut reader = pem;
    let ca_certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ValkeyError::InvalidConfig(format!("Failed to parse CA certificate: {}", e)))?;

    if ca_certs.is_empty() {
        return Err(ValkeyError::InvalidConfig(
            "CA bundle contains no certificates".to_string(),
        ));
    }

    let mut root_store = RootCertStore::empty();
    for cert in ca_certs {
        root_store.add(cert).map_err(|e| {
            ValkeyError::InvalidConfig(format!("Failed to add CA certificate: {}", e))
        })?;
    }

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(TlsConnector::from(config))
}
