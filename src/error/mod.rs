//! Error handling module.
//!
//! Issuance errors are local to one request, client errors to one
//! connection. Neither ever reaches the registry or other connections.

pub mod codes;

use crate::domain::ParseIdentifierError;

pub use codes::ErrorCode;

/// Failure to issue one identifier.
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    /// The entropy source was unavailable or returned an error.
    #[error("Random source failed: {0}")]
    RandomSource(String),

    /// Every attempt within the retry budget collided.
    #[error("Entropy exhausted after {attempts} attempts")]
    EntropyExhausted {
        /// Number of draws made before giving up.
        attempts: u32,
    },
}

impl IssueError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::RandomSource(_) => ErrorCode::RANDOM_SOURCE,
            Self::EntropyExhausted { .. } => ErrorCode::ENTROPY_EXHAUSTED,
        }
    }

    /// Short label used for metrics.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::RandomSource(_) => "random_source",
            Self::EntropyExhausted { .. } => "entropy_exhausted",
        }
    }
}

/// Failure of one client exchange.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The WebSocket handshake failed.
    #[error("Connect failed: {0}")]
    Connect(#[source] tokio_tungstenite::tungstenite::Error),

    /// Sending the request failed.
    #[error("Send failed: {0}")]
    Send(#[source] tokio_tungstenite::tungstenite::Error),

    /// Reading the response failed.
    #[error("Receive failed: {0}")]
    Receive(#[source] tokio_tungstenite::tungstenite::Error),

    /// The server closed the connection without responding.
    #[error("Connection closed before a response arrived")]
    Closed,

    /// No response arrived in time.
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The response was not a text message.
    #[error("Unexpected non-text response")]
    NonText,

    /// The response text was not a canonical identifier.
    #[error("Invalid identifier in response: {0}")]
    Parse(#[from] ParseIdentifierError),
}

/// Result type alias using `IssueError`.
pub type IssueResult<T> = std::result::Result<T, IssueError>;
