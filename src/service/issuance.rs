//! Identifier issuance service.
//!
//! Draws candidates from an [`IdSource`] and claims them in a [`Registry`],
//! retrying on collision until a candidate wins or the retry budget runs out.

use std::num::NonZeroU32;
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::domain::Identifier;
use crate::error::{IssueError, IssueResult};
use crate::service::generator::{IdSource, OsRngSource};
use crate::service::registry::Registry;

/// Default cap on draws per issuance.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1000;

/// How many colliding draws one issuance may make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryLimit {
    /// Retry until a candidate wins.
    Unbounded,
    /// Give up after this many draws.
    Attempts(NonZeroU32),
}

impl RetryLimit {
    /// Build a limit from a configured attempt count, where 0 means unbounded.
    #[must_use]
    pub fn from_max_attempts(max_attempts: u32) -> Self {
        NonZeroU32::new(max_attempts).map_or(Self::Unbounded, Self::Attempts)
    }

    /// Check whether `attempts` draws use up the budget.
    #[must_use]
    pub const fn is_exhausted(self, attempts: u32) -> bool {
        match self {
            Self::Unbounded => false,
            Self::Attempts(max) => attempts >= max.get(),
        }
    }
}

impl Default for RetryLimit {
    fn default() -> Self {
        Self::from_max_attempts(DEFAULT_MAX_ATTEMPTS)
    }
}

/// Issues identifiers that are unique for the lifetime of the service.
pub struct IssuanceService {
    /// Candidate source.
    source: Arc<dyn IdSource>,
    /// Every identifier issued so far.
    registry: Registry,
    /// Collision retry budget.
    retry_limit: RetryLimit,
}

impl IssuanceService {
    /// Create a service with the given source and retry budget.
    #[must_use]
    pub fn new(source: Arc<dyn IdSource>, retry_limit: RetryLimit) -> Self {
        Self {
            source,
            registry: Registry::new(),
            retry_limit,
        }
    }

    /// Create a service drawing from the OS CSPRNG.
    #[must_use]
    pub fn with_os_rng(retry_limit: RetryLimit) -> Self {
        Self::new(Arc::new(OsRngSource), retry_limit)
    }

    /// Issue one fresh identifier.
    ///
    /// Losing candidates are discarded; only the winning draw touches the
    /// registry.
    ///
    /// # Errors
    ///
    /// - [`IssueError::RandomSource`] if the source fails. Not retried.
    /// - [`IssueError::EntropyExhausted`] if every draw within the budget
    ///   collided.
    pub fn issue(&self) -> IssueResult<Identifier> {
        let result = self.claim_next();

        match &result {
            Ok(_) => counter!("idissuer_ids_issued_total").increment(1),
            Err(e) => {
                counter!("idissuer_issue_failures_total", "reason" => e.reason()).increment(1);
            }
        }

        result
    }

    fn claim_next(&self) -> IssueResult<Identifier> {
        let mut attempts: u32 = 0;

        loop {
            let candidate = self.source.draw()?;
            attempts = attempts.saturating_add(1);

            if self.registry.try_claim(candidate) {
                return Ok(candidate);
            }

            counter!("idissuer_collisions_total").increment(1);
            debug!(attempts, "Identifier collision, drawing again");

            if self.retry_limit.is_exhausted(attempts) {
                warn!(attempts, "Retry budget exhausted");
                return Err(IssueError::EntropyExhausted { attempts });
            }
        }
    }

    /// Draw one candidate without claiming it, to check the source works.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError::RandomSource`] if the source fails.
    pub fn check_source(&self) -> IssueResult<()> {
        self.source.draw().map(|_| ())
    }

    /// Number of identifiers issued so far.
    #[must_use]
    pub fn issued(&self) -> usize {
        self.registry.len()
    }

    /// The registry backing this service.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The configured retry budget.
    #[must_use]
    pub const fn retry_limit(&self) -> RetryLimit {
        self.retry_limit
    }
}

impl Default for IssuanceService {
    fn default() -> Self {
        Self::with_os_rng(RetryLimit::default())
    }
}
