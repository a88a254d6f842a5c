//! API layer module.
//!
//! The WebSocket issuance endpoint, health checks, and routing.

pub mod handlers;
pub mod router;
pub mod state;

pub use router::{WS_PATH, create_router};
pub use state::AppState;
