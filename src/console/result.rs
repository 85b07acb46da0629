//! Uniform result shape returned by every console operation.
//!
//! On the wire this is `{"success": true, "data": ...}` or
//! `{"success": false, "error": "...", "kind": "..."}`; `data` is omitted for
//! operations that produce nothing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::FailureKind;
use crate::client::ValkeyError;

/// Outcome of a console operation. Errors never escape as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult<T> {
    Success { data: Option<T> },
    Failure { error: String, kind: FailureKind },
}

impl<T> OperationResult<T> {
    /// Successful outcome carrying `data`.
    pub fn ok(data: T) -> Self {
        OperationResult::Success { data: Some(data) }
    }

    /// Successful outcome without a payload.
    pub fn done() -> Self {
        OperationResult::Success { data: None }
    }

    /// Failed outcome.
    pub fn failure(kind: FailureKind, error: impl Into<String>) -> Self {
        OperationResult::Failure {
            error: error.into(),
            kind,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationResult::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            OperationResult::Success { data } => data.as_ref(),
            OperationResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            OperationResult::Success { .. } => None,
            OperationResult::Failure { error, .. } => Some(error),
        }
    }

    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            OperationResult::Success { .. } => None,
            OperationResult::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Transform the payload of a successful outcome.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OperationResult<U> {
        match self {
            OperationResult::Success { data } => OperationResult::Success { data: data.map(f) },
            OperationResult::Failure { error, kind } => OperationResult::Failure { error, kind },
        }
    }

    /// Drop the payload, keeping only success or failure.
    pub fn discard(self) -> OperationResult<()> {
        match self {
            OperationResult::Success { .. } => OperationResult::done(),
            OperationResult::Failure { error, kind } => OperationResult::Failure { error, kind },
        }
    }

    pub fn into_result(self) -> Result<Option<T>, (FailureKind, String)> {
        match self {
            OperationResult::Success { data } => Ok(data),
            OperationResult::Failure { error, kind } => Err((kind, error)),
        }
    }
}

impl<T> From<Result<T, ValkeyError>> for OperationResult<T> {
    fn from(result: Result<T, ValkeyError>) -> Self {
        match result {
            Ok(data) => OperationResult::ok(data),
            Err(e) => OperationResult::failure(FailureKind::from(&e), e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct WireRef<'a, T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<FailureKind>,
}

#[derive(Deserialize)]
struct Wire<T> {
    success: bool,
    #[serde(default = "Option::default")]
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    kind: Option<FailureKind>,
}

impl<T: Serialize> Serialize for OperationResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            OperationResult::Success { data } => WireRef {
                success: true,
                data: data.as_ref(),
                error: None,
                kind: None,
            },
            OperationResult::Failure { error, kind } => WireRef {
                success: false,
                data: None,
                error: Some(error),
                kind: Some(*kind),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for OperationResult<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = Wire::<T>::deserialize(deserializer)?;
        if wire.success {
            Ok(OperationResult::Success { data: wire.data })
        } else {
            Ok(OperationResult::Failure {
                error: wire.error.unwrap_or_default(),
                kind: wire.kind.unwrap_or(FailureKind::Command),
            })
        }
    }
}
