//! Console façade over the key-value store.
//!
//! ## Architecture
//!
//! - `actions`: the [`Console`] operations (test connection, list/scan keys,
//!   read, write, delete)
//! - `phase`: lifecycle state machine of a single operation
//! - `result`: the uniform [`OperationResult`] shape
//! - `error`: [`FailureKind`] classification
//! - `store`: persistence of the last working connection parameters
//!
//! ## Example
//!
//! ```rust,ignore
//! use valkey_console::client::{ConnectionConfig, ValkeyConnector};
//! use valkey_console::console::{Console, ConsoleSettings};
//!
//! let console = Console::new(Arc::new(ValkeyConnector::default()), ConsoleSettings::default(), None);
//! let config = ConnectionConfig::new("localhost", "6379");
//! let result = console.get_value(&config, "greeting").await;
//! ```

pub mod actions;
pub mod error;
pub mod phase;
pub mod result;
pub mod store;

pub use actions::{Console, ConsoleSettings, Operation, filter_keys};
pub use error::FailureKind;
pub use phase::{PhaseTracker, SessionEvent, SessionPhase, next_phase};
pub use result::OperationResult;
pub use store::{ConnectionStore, STORAGE_KEY, StoreError};
