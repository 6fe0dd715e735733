//! Session Bounded Context
//!
//! The global trading-day state machine and the market window it runs against.

mod global_state;
mod market_window;
mod state_machine;

pub use global_state::GlobalState;
pub use market_window::{MarketWindow, SessionDefaults};
pub use state_machine::{GLOBAL, SessionStateMachine};
