//! Execution id deduplication.

use std::collections::HashSet;

use super::ExecutionId;

/// Append-only set of execution ids seen during the session.
///
/// Fill and commission notifications share one ledger: whichever path sees an
/// execution first claims it. Ids are never evicted; they are unique per
/// session and a session lasts one trading day.
#[derive(Debug, Default)]
pub struct ExecutionLedger {
    seen: HashSet<ExecutionId>,
}

impl ExecutionLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id`, returning `true` only on its first observation.
    pub fn observe(&mut self, id: &ExecutionId) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.clone())
    }

    /// Whether `id` has been observed.
    #[must_use]
    pub fn contains(&self, id: &ExecutionId) -> bool {
        self.seen.contains(id)
    }

    /// Number of distinct executions observed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been observed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
