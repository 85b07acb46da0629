//! HTTP server wiring.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tracing::info;

use super::handlers::{AppState, create_api_router};
use crate::health;

/// Errors running the HTTP server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Create the full router: console API plus health and metrics endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let health_router = health::create_router(state.health.clone());
    create_api_router(state).merge(health_router)
}

/// Serve the console on `addr` until `shutdown` resolves
pub async fn run_server<F>(
    addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(addr = %addr, "Starting console server");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)?;

    info!("Console server stopped");
    Ok(())
}
