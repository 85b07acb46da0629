//! Health and metrics endpoints.
//!
//! Provides:
//! - `/healthz` - Liveness probe (always returns 200 if server is running)
//! - `/readyz` - Readiness probe (returns 200 when ready to serve traffic)
//! - `/metrics` - Prometheus metrics endpoint

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabel, EncodeLabelSet, LabelSetEncoder};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use tokio::sync::RwLock;

/// Labels for per-operation outcome metrics (operation + outcome)
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct OutcomeLabels {
    pub operation: String,
    pub outcome: String,
}

impl EncodeLabelSet for OutcomeLabels {
    fn encode(&self, mut encoder: LabelSetEncoder<'_>) -> Result<(), std::fmt::Error> {
        ("operation", self.operation.as_str()).encode(encoder.encode_label())?;
        ("outcome", self.outcome.as_str()).encode(encoder.encode_label())?;
        Ok(())
    }
}

/// Labels for per-operation duration metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct OperationLabels {
    pub operation: String,
}

impl EncodeLabelSet for OperationLabels {
    fn encode(&self, mut encoder: LabelSetEncoder<'_>) -> Result<(), std::fmt::Error> {
        ("operation", self.operation.as_str()).encode(encoder.encode_label())?;
        Ok(())
    }
}

/// Shared metrics for the console
pub struct Metrics {
    /// Operations by outcome (`success` or a failure kind)
    pub operations_total: Family<OutcomeLabels, Counter>,
    /// Operation duration histogram, connect to close
    pub operation_duration_seconds: Family<OperationLabels, Histogram>,
    /// Operations currently holding or opening a connection
    pub operations_in_flight: Gauge,
    /// Prometheus registry
    registry: Registry,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance with registered metrics
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let operations_total = Family::<OutcomeLabels, Counter>::default();
        registry.register(
            "valkey_console_operations",
            "Total number of console operations by outcome",
            operations_total.clone(),
        );

        let operation_duration_seconds =
            Family::<OperationLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(exponential_buckets(0.001, 2.0, 15))
            });
        registry.register(
            "valkey_console_operation_duration_seconds",
            "Duration of console operations in seconds",
            operation_duration_seconds.clone(),
        );

        let operations_in_flight = Gauge::default();
        registry.register(
            "valkey_console_operations_in_flight",
            "Number of console operations currently running",
            operations_in_flight.clone(),
        );

        Self {
            operations_total,
            operation_duration_seconds,
            operations_in_flight,
            registry,
        }
    }

    /// Record a finished operation
    pub fn record_operation(&self, operation: &str, outcome: &str, duration_secs: f64) {
        let labels = OutcomeLabels {
            operation: operation.to_string(),
            outcome: outcome.to_string(),
        };
        self.operations_total.get_or_create(&labels).inc();
        self.operation_duration_seconds
            .get_or_create(&OperationLabels {
                operation: operation.to_string(),
            })
            .observe(duration_secs);
    }

    /// Count an operation as in flight until the returned guard is dropped
    pub fn track_in_flight(&self) -> InFlightGuard<'_> {
        self.operations_in_flight.inc();
        InFlightGuard {
            gauge: &self.operations_in_flight,
        }
    }

    /// Encode metrics to Prometheus text format
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        if encode(&mut buffer, &self.registry).is_err() {
            tracing::error!("Failed to encode metrics");
            return "# Error encoding metrics".to_string();
        }
        buffer
    }
}

/// Decrements the in-flight gauge on drop, including on cancellation
pub struct InFlightGuard<'a> {
    gauge: &'a Gauge,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

/// Shared state for the health endpoints
pub struct HealthState {
    /// Whether the console is ready to serve requests
    ready: RwLock<bool>,
    /// Metrics registry
    pub metrics: Metrics,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    /// Create a new health state (starts as not ready)
    pub fn new() -> Self {
        Self {
            ready: RwLock::new(false),
            metrics: Metrics::new(),
        }
    }

    /// Mark the console as ready or not ready
    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    /// Check if the console is ready
    pub async fn is_ready(&self) -> bool {
        *self.ready.read().await
    }
}

/// Liveness probe handler
async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Readiness probe handler
///
/// Returns 503 Service Unavailable until startup completes and again once
/// shutdown begins.
async fn readyz(State(state): State<Arc<HealthState>>) -> Response {
    if state.is_ready().await {
        (StatusCode::OK, "ready").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready").into_response()
    }
}

/// Metrics handler
async fn metrics_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let body = state.metrics.encode();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

/// Create the health router
pub fn create_router(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}
