//! valkey-console - web console for browsing and editing a Valkey store.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Loads configuration from the environment
//! - Builds the connector, console and connection store
//! - Serves the API and health endpoints until SIGTERM or SIGINT

use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};

use valkey_console::{
    AppConfig, AppState, Console, ConnectionStore, HealthState, ValkeyConnector, run_server,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("valkey_console=info".parse()?)
                .add_directive("fred=warn".parse()?),
        )
        .json()
        .init();

    info!("Starting valkey-console");

    // Both rustls and fred may pull in a provider; pick one explicitly
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        warn!("A rustls crypto provider was already installed");
    }

    let config = AppConfig::from_env()?;
    info!(
        listen_addr = %config.listen_addr,
        state_path = %config.state_path.display(),
        persist_password = config.persist_password,
        "Loaded configuration"
    );

    let mut client_config = config.client_config();
    if let Some(path) = &config.tls_ca_path {
        let pem = tokio::fs::read(path).await?;
        info!(path = %path.display(), "Using custom CA bundle for TLS connections");
        client_config = client_config.with_ca_cert_pem(pem);
    }

    let health_state = Arc::new(HealthState::new());
    let connector = Arc::new(ValkeyConnector::new(client_config));
    let console = Console::new(
        connector,
        config.console_settings(),
        Some(health_state.clone()),
    );

    let store = ConnectionStore::new(&config.state_path, config.persist_password);
    match store.load().await {
        Ok(Some(saved)) => info!(target = %saved.redacted_url(), "Found saved connection"),
        Ok(None) => info!("No saved connection"),
        Err(e) => warn!(error = %e, "Ignoring unreadable saved connection"),
    }

    let state = Arc::new(AppState::new(console, store, health_state.clone()));
    health_state.set_ready(true).await;

    let shutdown = {
        let health_state = health_state.clone();
        async move {
            shutdown_signal().await;
            info!("Received shutdown signal, draining in-flight requests...");
            // Stop receiving new work
            health_state.set_ready(false).await;
        }
    };

    run_server(config.listen_addr, state, shutdown).await?;

    info!("Console stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Note: Signal handler setup failures are fatal - the console cannot shut down
/// gracefully without them.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
