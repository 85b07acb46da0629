//! Connection seam between the console and the store client.
//!
//! A [`Connector`] opens one [`Session`] per console operation. The session is
//! wrapped in a [`ScopedSession`] guard so that the connection is released on
//! every exit path: an explicit [`ScopedSession::close`] on normal completion,
//! and a detached `QUIT` from `Drop` when the owning future is cancelled or a
//! deadline fires before the close was reached.

use std::ops::Deref;

use async_trait::async_trait;
use tracing::debug;

use super::connection::ConnectionConfig;
use super::types::{KeyPage, ScanRequest};
use super::valkey_client::ValkeyError;

/// One live connection to the store, owned by a single operation.
#[async_trait]
pub trait Session: Send + Sync {
    /// Liveness probe (`PING`).
    async fn ping(&self) -> Result<String, ValkeyError>;

    /// One incremental `SCAN` step.
    async fn scan(&self, request: &ScanRequest) -> Result<KeyPage, ValkeyError>;

    /// Read a string value; `None` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>, ValkeyError>;

    /// Create or overwrite a string value.
    async fn set(&self, key: &str, value: &str) -> Result<(), ValkeyError>;

    /// Remove a key, returning how many keys were removed.
    async fn delete(&self, key: &str) -> Result<u64, ValkeyError>;

    /// Gracefully close the connection.
    async fn close(&self) -> Result<(), ValkeyError>;

    /// Release the connection without waiting, for cleanup from `Drop`.
    fn close_detached(&self);
}

/// Opens sessions from operator-supplied connection parameters.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Session>, ValkeyError>;
}

/// Session guard that guarantees the connection is released.
pub struct ScopedSession {
    session: Box<dyn Session>,
    released: bool,
}

impl ScopedSession {
    /// Open a session through `connector`.
    pub async fn open(
        connector: &dyn Connector,
        config: &ConnectionConfig,
    ) -> Result<Self, ValkeyError> {
        let session = connector.connect(config).await?;
        Ok(Self {
            session,
            released: false,
        })
    }

    /// Close the session and wait for the server to acknowledge.
    pub async fn close(mut self) -> Result<(), ValkeyError> {
        let result = self.session.close().await;
        self.released = true;
        result
    }
}

impl Deref for ScopedSession {
    type Target = dyn Session;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        if !self.released {
            debug!("Session dropped before close, releasing in background");
            self.session.close_detached();
        }
    }
}
