//! Registry of issued identifiers.

use dashmap::DashSet;

use crate::domain::Identifier;

/// Concurrent set of every identifier claimed so far.
///
/// Keys are identifier values. The set only grows; nothing is ever evicted,
/// so memory is proportional to the number of identifiers issued.
#[derive(Debug, Default)]
pub struct Registry {
    claimed: DashSet<Identifier>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id` if nobody has yet.
    ///
    /// Returns `true` if the value was absent and is now claimed, `false` if
    /// it was already present. The membership check and the insert happen
    /// under the same shard lock, so concurrent claims of one value admit
    /// exactly one winner.
    #[must_use]
    pub fn try_claim(&self, id: Identifier) -> bool {
        self.claimed.insert(id)
    }

    /// Check whether `id` has been claimed.
    #[must_use]
    pub fn contains(&self, id: Identifier) -> bool {
        self.claimed.contains(&id)
    }

    /// Number of claimed identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    /// Check if nothing has been claimed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}
