//! Session State Machine
//!
//! INIT -> WAIT_MARKET_OPEN -> ACTIVE -> DONE, driven by venue time.

use crate::domain::session::{GlobalState, MarketWindow};
use crate::domain::shared::{StateChange, TransitionError, VenueTime};

/// Entity name used in global transition records.
pub const GLOBAL: &str = "GLOBAL";

/// Owns the global state and today's market window.
#[derive(Debug, Clone, Default)]
pub struct SessionStateMachine {
    state: GlobalState,
    window: Option<MarketWindow>,
    last_transition: Option<VenueTime>,
}

impl SessionStateMachine {
    /// Create a machine in INIT.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> GlobalState {
        self.state
    }

    /// Market window, once initialized.
    #[must_use]
    pub const fn window(&self) -> Option<&MarketWindow> {
        self.window.as_ref()
    }

    /// Session close, once initialized.
    #[must_use]
    pub fn close(&self) -> Option<VenueTime> {
        self.window.map(|w| w.close)
    }

    /// Returns true once the session is over.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.state.is_terminal()
    }

    /// Store today's window and move INIT -> WAIT_MARKET_OPEN.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` if the machine has already left INIT.
    pub fn initialize(
        &mut self,
        window: MarketWindow,
        now: VenueTime,
    ) -> Result<StateChange, TransitionError> {
        if self.state != GlobalState::Init {
            return Err(TransitionError::new(
                GLOBAL,
                self.state,
                GlobalState::WaitMarketOpen,
            ));
        }
        self.window = Some(window);
        Ok(self.switch(GlobalState::WaitMarketOpen, now))
    }

    /// Apply at most one time-driven transition.
    ///
    /// Nothing happens for a timestamp at or before the previous transition.
    pub fn advance(&mut self, now: VenueTime) -> Option<StateChange> {
        let window = self.window?;
        if self.last_transition.is_some_and(|last| now <= last) {
            return None;
        }

        match self.state {
            GlobalState::WaitMarketOpen if now >= window.open => {
                Some(self.switch(GlobalState::Active, now))
            }
            GlobalState::Active if now >= window.close => Some(self.switch(GlobalState::Done, now)),
            _ => None,
        }
    }

    fn switch(&mut self, to: GlobalState, now: VenueTime) -> StateChange {
        let change = StateChange::new(GLOBAL, self.state, to, now);
        self.state = to;
        self.last_transition = Some(now);
        change
    }
}
