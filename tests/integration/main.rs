// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Integration tests for valkey-console
//!
//! These tests require a running Valkey (or Redis) server without
//! authentication. Tests are marked with #[ignore] and must be run explicitly:
//!
//! ```bash
//! # Start a throwaway server
//! docker run --rm -p 6379:6379 valkey/valkey:8
//!
//! # Run all integration tests
//! cargo test --test integration -- --ignored
//!
//! # Point at a different server
//! VALKEY_HOST=10.0.0.5 VALKEY_PORT=6380 cargo test --test integration -- --ignored
//! ```
//!
//! ## Design Principles
//!
//! - **Parallel Test Execution**: every test writes under its own unique key
//!   prefix, so tests never observe each other's data
//! - **Cleanup**: tests delete what they create through the console itself

// Shared test fixtures (used by unit, integration, and proptest)
#[path = "../common/mod.rs"]
mod common;


use std::sync::Arc;

use valkey_console::client::ValkeyClientConfig;
use valkey_console::{Console, ConsoleSettings, HealthState, ValkeyConnector};

/// Console backed by the real `fred` connector.
pub fn live_console() -> (Console, Arc<HealthState>) {
    // Already installed by an earlier test in this binary is fine
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let health = Arc::new(HealthState::new());
    let connector = Arc::new(ValkeyConnector::new(ValkeyClientConfig::default()));
    let console = Console::new(connector, ConsoleSettings::default(), Some(health.clone()));
    (console, health)
}
