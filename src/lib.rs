//! valkey-console library crate
//!
//! A small administration console for Valkey/Redis-compatible key-value
//! stores. Every operation opens its own connection from caller-supplied
//! parameters, runs one logical command and closes the connection again.

pub mod api;
pub mod client;
pub mod config;
pub mod console;
pub mod health;

pub use api::{AppState, ServerError, create_router, run_server};
pub use client::{ConnectionConfig, ValkeyConnector, ValkeyError};
pub use config::{AppConfig, ConfigError};
pub use console::{Console, ConsoleSettings, ConnectionStore, FailureKind, OperationResult};
pub use health::HealthState;
