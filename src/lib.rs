//! # `IDIssuer`
//!
//! A WebSocket service that answers every inbound message with a fresh
//! random 128-bit identifier, never issuing the same value twice for the
//! lifetime of the process.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          IDIssuer Service                         │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐   ┌──────────────────┐   ┌──────────────────┐  │
//! │  │  API Layer   │   │ IssuanceService  │ → │ IdSource (draw)  │  │
//! │  │ (Axum, /ws)  │ → │  (retry loop)    │ → │ Registry (claim) │  │
//! │  └──────────────┘   └──────────────────┘   └──────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The registry is the only state shared between connections.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

pub mod api;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::api::state::AppState;
use crate::api::{WS_PATH, create_router};
use crate::config::{AppConfig, LogFormat};

/// Interval between Prometheus recorder upkeep runs.
const METRICS_UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Run the `IDIssuer` service.
///
/// This function:
/// 1. Loads configuration from files and environment
/// 2. Installs logging and, if enabled, the metrics recorder
/// 3. Creates the issuance service with an empty registry
/// 4. Starts the HTTP/WebSocket server
/// 5. Handles graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded
/// - The metrics recorder cannot be installed
/// - The server fails to bind
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load()?;

    init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting IDIssuer");

    let mut state = AppState::new(Arc::new(config.clone()));
    info!(retry_limit = ?state.issuance.retry_limit(), "Issuance service initialized");

    if config.observability.metrics_enabled {
        state = state.with_metrics(init_metrics()?);
    }

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, path = WS_PATH, "WebSocket server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize logging based on configuration.
pub(crate) fn init_logging(config: &AppConfig) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match config.observability.log_format {
        LogFormat::Json => subscriber.with(fmt::layer().json()).init(),
        LogFormat::Text => subscriber.with(fmt::layer()).init(),
    }
}

/// Install the global Prometheus recorder and keep it tidy.
fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    let upkeep = handle.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(METRICS_UPKEEP_INTERVAL);
        loop {
            interval.tick().await;
            upkeep.run_upkeep();
        }
    });

    Ok(handle)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
