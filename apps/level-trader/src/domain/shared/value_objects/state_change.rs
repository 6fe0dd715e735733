//! State change record returned by the state machines.

use std::fmt;

use super::{VenueTime, log_stamp};

/// A transition that took place, for the caller to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    /// Symbol, or `GLOBAL` for the session.
    pub entity: String,
    /// Previous state.
    pub from: String,
    /// New state.
    pub to: String,
    /// Venue time of the transition.
    pub at: VenueTime,
}

impl StateChange {
    /// Record a transition.
    #[must_use]
    pub fn new(
        entity: impl Into<String>,
        from: impl ToString,
        to: impl ToString,
        at: VenueTime,
    ) -> Self {
        Self {
            entity: entity.into(),
            from: from.to_string(),
            to: to.to_string(),
            at,
        }
    }
}

impl fmt::Display for StateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} -> {}",
            log_stamp(&self.at),
            self.entity,
            self.from,
            self.to
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn state_change_display() {
        let at = DateTime::parse_from_rfc3339("2024-03-15T09:30:00-04:00").unwrap();
        let change = StateChange::new("GLOBAL", "WAIT_MARKET_OPEN", "ACTIVE", at);
        assert_eq!(
            change.to_string(),
            "20240315 09:30:00 GLOBAL: WAIT_MARKET_OPEN -> ACTIVE"
        );
    }
}
