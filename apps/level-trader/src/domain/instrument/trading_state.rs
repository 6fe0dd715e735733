//! Per-instrument trading state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Trading state of one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradingState {
    /// Flat and watching for a crossing.
    #[default]
    Idle,
    /// A bracket is working.
    Active,
    /// The traded contract could not be resolved. Terminal.
    DoneNoValidDerivative,
}

impl TradingState {
    /// Returns true if the state can never be left.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::DoneNoValidDerivative)
    }

    /// Check if a state transition is valid.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Idle, Self::Active | Self::DoneNoValidDerivative) | (Self::Active, Self::Idle)
        )
    }
}

impl fmt::Display for TradingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Active => write!(f, "ACTIVE"),
            Self::DoneNoValidDerivative => write!(f, "DONE_NO_VALID_DERIVATIVE"),
        }
    }
}
