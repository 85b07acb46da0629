//! Request handlers for the console endpoints.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::{ConnectionConfig, KeyPage, ScanRequest};
use crate::console::{
    Console, ConnectionStore, FailureKind, OperationResult, filter_keys,
};
use crate::health::HealthState;

/// Shared state for the API handlers
pub struct AppState {
    pub console: Console,
    pub store: ConnectionStore,
    pub health: Arc<HealthState>,
}

impl AppState {
    pub fn new(console: Console, store: ConnectionStore, health: Arc<HealthState>) -> Self {
        Self {
            console,
            store,
            health,
        }
    }
}

/// Body of `POST /api/keys`
#[derive(Debug, Deserialize)]
pub struct ListKeysRequest {
    pub config: ConnectionConfig,
    /// Case-insensitive substring filter applied to the listing
    #[serde(default)]
    pub search: Option<String>,
}

/// Body of `POST /api/keys/scan`
#[derive(Debug, Deserialize)]
pub struct ScanKeysRequest {
    pub config: ConnectionConfig,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
}

/// Body of `POST /api/keys/get` and `POST /api/keys/delete`
#[derive(Debug, Deserialize)]
pub struct KeyRequest {
    pub config: ConnectionConfig,
    pub key: String,
}

/// Body of `POST /api/keys/set`
#[derive(Debug, Deserialize)]
pub struct SetValueRequest {
    pub config: ConnectionConfig,
    pub key: String,
    pub value: String,
}

/// Create the console API router
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/connection", get(saved_connection))
        .route("/api/connection/test", post(test_connection))
        .route("/api/keys", post(list_keys))
        .route("/api/keys/scan", post(scan_keys))
        .route("/api/keys/get", post(get_value))
        .route("/api/keys/set", post(set_value))
        .route("/api/keys/delete", post(delete_key))
        .with_state(state)
}

/// Test the connection and remember it on success
async fn test_connection(
    State(state): State<Arc<AppState>>,
    Json(config): Json<ConnectionConfig>,
) -> Json<OperationResult<()>> {
    let result = state.console.test_connection(&config).await;
    if result.is_success() {
        // Saving is best effort; the test itself already succeeded
        if let Err(e) = state.store.save(&config).await {
            warn!(error = %e, "Failed to save connection configuration");
        }
    }
    Json(result)
}

/// Return the last successfully tested connection, if any
async fn saved_connection(
    State(state): State<Arc<AppState>>,
) -> Json<OperationResult<Option<ConnectionConfig>>> {
    let result = match state.store.load().await {
        Ok(saved) => OperationResult::ok(saved),
        Err(e) => {
            warn!(error = %e, "Failed to load saved connection");
            OperationResult::failure(FailureKind::Storage, e.to_string())
        }
    };
    Json(result)
}

async fn list_keys(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ListKeysRequest>,
) -> Json<OperationResult<Vec<String>>> {
    let result = state.console.get_keys(&request.config).await;
    let result = match request.search.as_deref() {
        Some(term) => result.map(|keys| filter_keys(keys, term)),
        None => result,
    };
    Json(result)
}

async fn scan_keys(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScanKeysRequest>,
) -> Json<OperationResult<KeyPage>> {
    let scan = match ScanRequest::from_parts(request.cursor, request.pattern, request.count) {
        Ok(scan) => scan,
        Err(e) => {
            debug!(error = %e, "Rejected scan request");
            return Json(OperationResult::failure(
                FailureKind::InvalidConfig,
                e.to_string(),
            ));
        }
    };
    Json(state.console.scan_keys(&request.config, scan).await)
}

async fn get_value(
    State(state): State<Arc<AppState>>,
    Json(request): Json<KeyRequest>,
) -> Json<OperationResult<String>> {
    Json(state.console.get_value(&request.config, &request.key).await)
}

async fn set_value(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetValueRequest>,
) -> Json<OperationResult<()>> {
    Json(
        state
            .console
            .set_value(&request.config, &request.key, &request.value)
            .await,
    )
}

async fn delete_key(
    State(state): State<Arc<AppState>>,
    Json(request): Json<KeyRequest>,
) -> Json<OperationResult<()>> {
    Json(state.console.delete_key(&request.config, &request.key).await)
}
