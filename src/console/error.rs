//! Failure classification for console operations.
//!
//! Every error collapses into an [`OperationResult`](super::OperationResult)
//! failure carrying the message text and one of these coarse kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::client::ValkeyError;

/// Coarse failure category reported to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Rejected before any network call (empty host, bad port, bad cursor)
    InvalidConfig,
    /// Unreachable host, refused connection, auth or TLS failure
    Connection,
    /// The command itself failed on the server
    Command,
    /// The operation did not finish within its deadline
    Timeout,
    /// Saved connection state could not be read or written
    Storage,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InvalidConfig => "invalid_config",
            FailureKind::Connection => "connection",
            FailureKind::Command => "command",
            FailureKind::Timeout => "timeout",
            FailureKind::Storage => "storage",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&ValkeyError> for FailureKind {
    fn from(err: &ValkeyError) -> Self {
        match err {
            ValkeyError::InvalidConfig(_) => FailureKind::InvalidConfig,
            ValkeyError::Connection(_) => FailureKind::Connection,
            ValkeyError::Timeout { .. } => FailureKind::Timeout,
            // A cursor rejected by our own parser is caller input, not a server fault
            ValkeyError::Parse(crate::client::ParseError::InvalidCursor(_)) => {
                FailureKind::InvalidConfig
            }
            ValkeyError::Redis(_) | ValkeyError::Parse(_) => FailureKind::Command,
        }
    }
}
