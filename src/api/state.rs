//! Application state for Axum handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::AppConfig;
use crate::service::IssuanceService;

/// Shared application state.
///
/// Every connection handler gets a clone; the issuance service (and the
/// registry inside it) is the only thing they share.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Identifier issuance service.
    pub issuance: Arc<IssuanceService>,
    /// Prometheus render handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new application state drawing from the OS CSPRNG.
    #[must_use]
    pub fn new(config: Arc<AppConfig>) -> Self {
        let issuance = Arc::new(IssuanceService::with_os_rng(config.issuance.retry_limit()));
        Self::with_issuance(config, issuance)
    }

    /// Create a state around an existing issuance service.
    #[must_use]
    pub const fn with_issuance(config: Arc<AppConfig>, issuance: Arc<IssuanceService>) -> Self {
        Self {
            config,
            issuance,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
