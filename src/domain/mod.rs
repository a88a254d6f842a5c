//! Domain models for `IDIssuer`.
//!
//! The identifier value type and the API contracts of the HTTP side endpoints.

pub mod dto;
pub mod identifier;

pub use dto::{ApiResponse, HealthResponse, ReadyResponse};
pub use identifier::{Identifier, ParseIdentifierError};
