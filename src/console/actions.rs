//! The console's operation façade.
//!
//! Each public operation validates the connection parameters, opens a
//! dedicated session, issues one logical command, releases the session and
//! maps the outcome into an [`OperationResult`]. Nothing is shared between
//! calls, so concurrent operations never contend on anything inside the
//! console.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::error::FailureKind;
use super::phase::{PhaseTracker, SessionEvent};
use super::result::OperationResult;
use crate::client::{
    ConnectionConfig, Connector, KeyPage, MATCH_ALL, ScanRequest, ScopedSession, Session,
    ValkeyError,
};
use crate::health::HealthState;

/// Operations exposed by the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    TestConnection,
    GetKeys,
    ScanKeys,
    GetValue,
    SetValue,
    DeleteKey,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::TestConnection => "test_connection",
            Operation::GetKeys => "get_keys",
            Operation::ScanKeys => "scan_keys",
            Operation::GetValue => "get_value",
            Operation::SetValue => "set_value",
            Operation::DeleteKey => "delete_key",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunables for console operations
#[derive(Clone, Debug)]
pub struct ConsoleSettings {
    /// Deadline for connect + command + close of a single operation
    pub operation_timeout: Duration,
    /// `COUNT` hint for each `SCAN` step when listing all keys
    pub scan_count: u32,
    /// Upper bound on keys returned by a full listing
    pub max_keys: usize,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(45),
            scan_count: crate::client::DEFAULT_SCAN_COUNT,
            max_keys: 10_000,
        }
    }
}

/// One logical command executed against an open session
#[async_trait]
trait Action: Send {
    type Output: Send;

    fn operation(&self) -> Operation;

    async fn apply(self, session: &dyn Session) -> Result<Self::Output, ValkeyError>;
}

struct Probe;

#[async_trait]
impl Action for Probe {
    type Output = ();

    fn operation(&self) -> Operation {
        Operation::TestConnection
    }

    async fn apply(self, session: &dyn Session) -> Result<(), ValkeyError> {
        let reply = session.ping().await?;
        debug!(reply = %reply, "Ping succeeded");
        Ok(())
    }
}

struct ListKeys {
    scan_count: u32,
    max_keys: usize,
}

#[async_trait]
impl Action for ListKeys {
    type Output = Vec<String>;

    fn operation(&self) -> Operation {
        Operation::GetKeys
    }

    async fn apply(self, session: &dyn Session) -> Result<Vec<String>, ValkeyError> {
        let mut request = ScanRequest {
            pattern: MATCH_ALL.to_string(),
            count: self.scan_count,
            ..Default::default()
        };
        let mut seen = HashSet::new();
        let mut keys = Vec::new();

        loop {
            let page = session.scan(&request).await?;
            let complete = page.is_complete();
            // SCAN may return a key more than once across pages
            for key in page.keys {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }

            if keys.len() >= self.max_keys {
                if keys.len() > self.max_keys || !complete {
                    warn!(limit = self.max_keys, "Key listing truncated");
                }
                keys.truncate(self.max_keys);
                break;
            }
            if complete {
                break;
            }
            request = request.next(page.cursor);
        }

        Ok(keys)
    }
}

struct ScanPage {
    request: ScanRequest,
}

#[async_trait]
impl Action for ScanPage {
    type Output = KeyPage;

    fn operation(&self) -> Operation {
        Operation::ScanKeys
    }

    async fn apply(self, session: &dyn Session) -> Result<KeyPage, ValkeyError> {
        session.scan(&self.request).await
    }
}

struct ReadValue {
    key: String,
}

#[async_trait]
impl Action for ReadValue {
    type Output = String;

    fn operation(&self) -> Operation {
        Operation::GetValue
    }

    async fn apply(self, session: &dyn Session) -> Result<String, ValkeyError> {
        // An absent key reads as the empty string
        Ok(session.get(&self.key).await?.unwrap_or_default())
    }
}

struct WriteValue {
    key: String,
    value: String,
}

#[async_trait]
impl Action for WriteValue {
    type Output = ();

    fn operation(&self) -> Operation {
        Operation::SetValue
    }

    async fn apply(self, session: &dyn Session) -> Result<(), ValkeyError> {
        session.set(&self.key, &self.value).await
    }
}

struct RemoveKey {
    key: String,
}

#[async_trait]
impl Action for RemoveKey {
    type Output = ();

    fn operation(&self) -> Operation {
        Operation::DeleteKey
    }

    async fn apply(self, session: &dyn Session) -> Result<(), ValkeyError> {
        let removed = session.delete(&self.key).await?;
        debug!(key = %self.key, removed, "Delete completed");
        Ok(())
    }
}

/// Connection-parameterized CRUD façade over the store
#[derive(Clone)]
pub struct Console {
    connector: Arc<dyn Connector>,
    settings: ConsoleSettings,
    health_state: Option<Arc<HealthState>>,
}

impl Console {
    /// Create a console that opens sessions through `connector`
    pub fn new(
        connector: Arc<dyn Connector>,
        settings: ConsoleSettings,
        health_state: Option<Arc<HealthState>>,
    ) -> Self {
        Self {
            connector,
            settings,
            health_state,
        }
    }

    /// Connect and `PING`.
    pub async fn test_connection(&self, config: &ConnectionConfig) -> OperationResult<()> {
        self.run(config, Probe).await.discard()
    }

    /// List every key, iterating `SCAN` until the cursor wraps or the
    /// configured ceiling is reached. Order is unspecified.
    pub async fn get_keys(&self, config: &ConnectionConfig) -> OperationResult<Vec<String>> {
        let action = ListKeys {
            scan_count: self.settings.scan_count,
            max_keys: self.settings.max_keys,
        };
        self.run(config, action).await
    }

    /// Fetch a single page of keys with a caller-held cursor.
    pub async fn scan_keys(
        &self,
        config: &ConnectionConfig,
        request: ScanRequest,
    ) -> OperationResult<KeyPage> {
        self.run(config, ScanPage { request }).await
    }

    /// Read the string value of `key`; an absent key yields `""`.
    pub async fn get_value(&self, config: &ConnectionConfig, key: &str) -> OperationResult<String> {
        let action = ReadValue {
            key: key.to_string(),
        };
        self.run(config, action).await
    }

    /// Create or overwrite the string value of `key`.
    pub async fn set_value(
        &self,
        config: &ConnectionConfig,
        key: &str,
        value: &str,
    ) -> OperationResult<()> {
        let action = WriteValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        self.run(config, action).await.discard()
    }

    /// Remove `key`. Removing an absent key succeeds.
    pub async fn delete_key(&self, config: &ConnectionConfig, key: &str) -> OperationResult<()> {
        let action = RemoveKey {
            key: key.to_string(),
        };
        self.run(config, action).await.discard()
    }

    async fn run<A: Action>(
        &self,
        config: &ConnectionConfig,
        action: A,
    ) -> OperationResult<A::Output> {
        let operation = action.operation();
        let _in_flight = self
            .health_state
            .as_ref()
            .map(|state| state.metrics.track_in_flight());
        let started = Instant::now();

        let outcome = match config.validate() {
            Ok(()) => self.execute(operation, config, action).await,
            Err(e) => Err(e),
        };

        let elapsed = started.elapsed();
        let label = match &outcome {
            Ok(_) => {
                debug!(
                    operation = %operation,
                    target = %config.redacted_url(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Operation succeeded"
                );
                "success"
            }
            Err(e) => {
                let kind = FailureKind::from(e);
                warn!(
                    operation = %operation,
                    target = %config.redacted_url(),
                    kind = %kind,
                    error = %e,
                    "Operation failed"
                );
                kind.as_str()
            }
        };

        if let Some(state) = &self.health_state {
            state
                .metrics
                .record_operation(operation.as_str(), label, elapsed.as_secs_f64());
        }

        OperationResult::from(outcome)
    }

    async fn execute<A: Action>(
        &self,
        operation: Operation,
        config: &ConnectionConfig,
        action: A,
    ) -> Result<A::Output, ValkeyError> {
        let deadline = self.settings.operation_timeout;
        let mut tracker = PhaseTracker::new(operation);

        let work = async {
            tracker.advance(SessionEvent::Connect);
            let session = match ScopedSession::open(self.connector.as_ref(), config).await {
                Ok(session) => session,
                Err(e) => {
                    tracker.advance(SessionEvent::Failed);
                    // Nothing was opened, so nothing to release
                    tracker.advance(SessionEvent::Released);
                    return Err(e);
                }
            };
            tracker.advance(SessionEvent::Connected);

            let result = action.apply(&*session).await;
            tracker.advance(if result.is_ok() {
                SessionEvent::Completed
            } else {
                SessionEvent::Failed
            });

            if let Err(e) = session.close().await {
                warn!(operation = %operation, error = %e, "Failed to close session cleanly");
            }
            tracker.advance(SessionEvent::Released);
            result
        };

        let outcome = tokio::time::timeout(deadline, work).await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                // The dropped session guard releases the connection in the background
                warn!(
                    operation = %operation,
                    phase = %tracker.phase(),
                    timeout = ?deadline,
                    "Operation deadline exceeded"
                );
                Err(ValkeyError::Timeout {
                    operation: operation.to_string(),
                    duration: deadline,
                })
            }
        }
    }
}

/// Case-insensitive substring filter used by the key browser search box.
/// An empty term keeps every key.
pub fn filter_keys(keys: Vec<String>, term: &str) -> Vec<String> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return keys;
    }
    keys.into_iter()
        .filter(|key| key.to_lowercase().contains(&term))
        .collect()
}
