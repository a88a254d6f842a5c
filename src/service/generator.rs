//! Candidate identifier sources.

use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::domain::Identifier;
use crate::error::{IssueError, IssueResult};

/// A source of candidate identifiers.
///
/// Implementations draw one value per call. Failures are reported, never
/// retried here; retrying on collision is the issuance service's job.
pub trait IdSource: Send + Sync {
    /// Draw one candidate identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError::RandomSource`] if the underlying source fails.
    fn draw(&self) -> IssueResult<Identifier>;
}

/// Draws identifiers uniformly over the 128-bit space from the operating
/// system's CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRngSource;

impl IdSource for OsRngSource {
    fn draw(&self) -> IssueResult<Identifier> {
        let mut bytes = [0u8; Identifier::BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| IssueError::RandomSource(e.to_string()))?;
        Ok(Identifier::from_bytes(bytes))
    }
}
