//! HTTP API for the console.
//!
//! Every data endpoint answers `200 OK` with an
//! [`OperationResult`](crate::console::OperationResult) body; transport-level
//! failures are the only non-200 responses.

pub mod handlers;
pub mod server;

pub use handlers::{
    AppState, KeyRequest, ListKeysRequest, ScanKeysRequest, SetValueRequest, create_api_router,
};
pub use server::{ServerError, create_router, run_server};
