//! Persistence of the last working connection parameters.
//!
//! The configuration is kept as a flat JSON record under a fixed key so the
//! connection form can be pre-filled on the next visit. It is overwritten
//! every time a connection test succeeds.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::client::ConnectionConfig;

/// Key under which the configuration is stored
pub const STORAGE_KEY: &str = "redisConnectionConfig";

/// Errors reading or writing the state file
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed state file: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// File-backed store for the saved connection configuration
///
/// Clones share one write lock, so saves through any clone never interleave.
#[derive(Clone, Debug)]
pub struct ConnectionStore {
    path: PathBuf,
    persist_password: bool,
    write_lock: Arc<Mutex<()>>,
}

impl ConnectionStore {
    /// Create a store backed by `path`.
    ///
    /// Unless `persist_password` is set, the password is stripped before
    /// writing so no secret lands on disk in plaintext.
    pub fn new(path: impl Into<PathBuf>, persist_password: bool) -> Self {
        Self {
            path: path.into(),
            persist_password,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved configuration, `None` if nothing was saved yet.
    pub async fn load(&self) -> Result<Option<ConnectionConfig>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No saved connection");
                return Ok(None);
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let mut record: Map<String, Value> = serde_json::from_str(&contents)?;
        match record.remove(STORAGE_KEY) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Overwrite the saved configuration.
    pub async fn save(&self, config: &ConnectionConfig) -> Result<(), StoreError> {
        let config = if self.persist_password {
            config.clone()
        } else {
            config.without_password()
        };

        let mut record = Map::new();
        record.insert(STORAGE_KEY.to_string(), serde_json::to_value(&config)?);
        let body = serde_json::to_vec_pretty(&Value::Object(record))?;

        // Write-then-rename so a crash never leaves a truncated file behind.
        // Saves share the temp path, so only one may be between the two steps.
        let _guard = self.write_lock.lock().await;
        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, body)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;

        info!(
            path = %self.path.display(),
            target = %config.redacted_url(),
            "Saved connection configuration"
        );
        Ok(())
    }
}
