//! Types for key enumeration requests and parsed replies.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cursor value that starts an iteration and marks its end.
pub const START_CURSOR: &str = "0";

/// Pattern that matches every key.
pub const MATCH_ALL: &str = "*";

/// Page size hint used when the caller does not provide one.
pub const DEFAULT_SCAN_COUNT: u32 = 100;

/// Largest page size hint accepted from callers.
pub const MAX_SCAN_COUNT: u32 = 1000;

/// Errors that can occur when parsing command replies.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid SCAN reply: {0}")]
    InvalidScanReply(String),
    #[error("Invalid scan cursor: {0}")]
    InvalidCursor(String),
}

/// One step of an incremental `SCAN` iteration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Cursor returned by the previous page, `"0"` to start.
    pub cursor: String,
    /// Glob-style `MATCH` pattern.
    pub pattern: String,
    /// `COUNT` hint passed to the server.
    pub count: u32,
}

impl Default for ScanRequest {
    fn default() -> Self {
        Self {
            cursor: START_CURSOR.to_string(),
            pattern: MATCH_ALL.to_string(),
            count: DEFAULT_SCAN_COUNT,
        }
    }
}

impl ScanRequest {
    /// Build a request from optional caller input, filling in defaults.
    ///
    /// Blank cursors and patterns fall back to a fresh full scan; the count
    /// hint is clamped to `1..=MAX_SCAN_COUNT`.
    pub fn from_parts(
        cursor: Option<String>,
        pattern: Option<String>,
        count: Option<u32>,
    ) -> Result<Self, ParseError> {
        let cursor = cursor
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| START_CURSOR.to_string());
        if cursor.parse::<u64>().is_err() {
            return Err(ParseError::InvalidCursor(cursor));
        }

        let pattern = pattern
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| MATCH_ALL.to_string());

        let count = match count {
            None | Some(0) => DEFAULT_SCAN_COUNT,
            Some(n) => n.min(MAX_SCAN_COUNT),
        };

        Ok(Self {
            cursor,
            pattern,
            count,
        })
    }

    /// Continue this iteration from `cursor`.
    pub fn next(&self, cursor: impl Into<String>) -> Self {
        Self {
            cursor: cursor.into(),
            ..self.clone()
        }
    }
}

/// One page of keys returned by `SCAN`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPage {
    /// Keys in this page. The server may repeat keys across pages.
    pub keys: Vec<String>,
    /// Cursor for the next page; `"0"` when the iteration is complete.
    pub cursor: String,
}

impl KeyPage {
    /// Whether the server reported the end of the iteration.
    pub fn is_complete(&self) -> bool {
        self.cursor == START_CURSOR
    }
}
