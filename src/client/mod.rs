//! Valkey client module.
//!
//! This module provides a thin wrapper around the `fred` client for the
//! console's single-command sessions. It handles connection parameters,
//! TLS configuration and reply parsing.
//!
//! ## Architecture
//!
//! - `connection`: operator-supplied parameters and descriptor rendering
//! - `session`: the [`Connector`]/[`Session`] seam and the release guard
//! - `valkey_client`: `fred`-backed session with TLS and timeouts
//! - `types` / `parsing`: scan requests, key pages and reply parsing

pub mod connection;
pub mod parsing;
pub mod session;
pub mod types;
pub mod valkey_client;

pub use connection::{ConnectionConfig, DEFAULT_PORT, PLAIN_SCHEME, SECURE_SCHEME};
pub use session::{Connector, ScopedSession, Session};
pub use types::{
    DEFAULT_SCAN_COUNT, KeyPage, MATCH_ALL, MAX_SCAN_COUNT, ParseError, START_CURSOR, ScanRequest,
};
pub use valkey_client::{ValkeyClient, ValkeyClientConfig, ValkeyConnector, ValkeyError};
