//! Global session state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of one trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GlobalState {
    /// Market window not yet computed.
    #[default]
    Init,
    /// Window known, market not open yet.
    WaitMarketOpen,
    /// Regular session in progress; entries allowed.
    Active,
    /// Session closed. Terminal.
    Done,
}

impl GlobalState {
    /// The state that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::WaitMarketOpen),
            Self::WaitMarketOpen => Some(Self::Active),
            Self::Active => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Returns true once the session is over.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for GlobalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "INIT"),
            Self::WaitMarketOpen => write!(f, "WAIT_MARKET_OPEN"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Done => write!(f, "DONE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_state_order() {
        let mut state = GlobalState::default();
        let mut seen = vec![state];
        while let Some(next) = state.next() {
            state = next;
            seen.push(state);
        }
        assert_eq!(
            seen,
            vec![
                GlobalState::Init,
                GlobalState::WaitMarketOpen,
                GlobalState::Active,
                GlobalState::Done
            ]
        );
        assert!(state.is_terminal());
    }

    #[test]
    fn global_state_display() {
        assert_eq!(GlobalState::WaitMarketOpen.to_string(), "WAIT_MARKET_OPEN");
        assert_eq!(GlobalState::Done.to_string(), "DONE");
    }
}
