//! Error code constants.
//!
//! Codes are grouped by category:
//! - 5xxx: Internal/System errors
//!
//! Codes appear in structured logs and in the readiness payload; the
//! WebSocket protocol itself carries no error payload.

/// Error code type with semantic categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(i32);

impl ErrorCode {
    // ===== Internal/System Errors (5xxx) =====

    /// Entropy source failure.
    pub const RANDOM_SOURCE: Self = Self(5001);

    /// Retry budget exhausted by collisions.
    pub const ENTROPY_EXHAUSTED: Self = Self(5002);

    /// Service unavailable.
    pub const SERVICE_UNAVAILABLE: Self = Self(5003);

    /// Get the error code as an i32.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.0
    }
}
