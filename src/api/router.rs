//! Router setup and configuration.

use axum::{Router, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{health, ws};
use crate::api::state::AppState;

/// Path of the WebSocket upgrade endpoint.
pub const WS_PATH: &str = "/ws";

/// Create the main application router.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/metrics", get(health::metrics));

    let middleware = ServiceBuilder::new().layer(TraceLayer::new_for_http());

    Router::new()
        .merge(health_routes)
        .route(WS_PATH, get(ws::upgrade))
        .layer(middleware)
        .with_state(state)
}
