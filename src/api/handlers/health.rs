//! Health check handlers.

use axum::{Json, extract::State, http::StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::api::state::AppState;
use crate::domain::{ApiResponse, HealthResponse, ReadyResponse};
use crate::error::ErrorCode;

/// Served from `/metrics` when no Prometheus recorder is installed.
const FALLBACK_METRICS: &str = "# HELP idissuer_up Whether the service is up
# TYPE idissuer_up gauge
idissuer_up 1
";

/// Liveness check - always returns 200 if the service is running.
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Readiness check - verifies that the entropy source can serve draws.
pub async fn ready(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<ReadyResponse>>) {
    let source_ok = state.issuance.check_source().is_ok();
    let data = ReadyResponse {
        ready: source_ok,
        issued: u64::try_from(state.issuance.issued()).unwrap_or(u64::MAX),
    };

    if source_ok {
        (StatusCode::OK, Json(ApiResponse::success(data)))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::failure(
                ErrorCode::SERVICE_UNAVAILABLE.as_i32(),
                "service unavailable",
                data,
            )),
        )
    }
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics
        .as_ref()
        .map_or_else(|| FALLBACK_METRICS.to_string(), PrometheusHandle::render)
}
