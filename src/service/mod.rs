//! Service layer module.
//!
//! Contains the identifier issuance core: candidate sources, the registry of
//! claimed identifiers, and the retrying issuance service built from both.

pub mod generator;
pub mod issuance;
pub mod registry;

pub use generator::{IdSource, OsRngSource};
pub use issuance::{DEFAULT_MAX_ATTEMPTS, IssuanceService, RetryLimit};
pub use registry::Registry;
