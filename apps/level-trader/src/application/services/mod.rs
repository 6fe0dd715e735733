//! Application Services
//!
//! Application services coordinate domain logic and the driven ports.
//! The supervisor runs for the whole process lifetime and drives one
//! trading session iteration at a time.

pub mod subscriptions;
pub mod supervisor;
pub mod trading_session;

pub use subscriptions::{Subscription, SubscriptionRegistry};
pub use supervisor::{
    FIRST_MANAGED_ACCOUNT, ReconnectPause, Supervisor, SupervisorExit, SupervisorPolicy,
    select_account,
};
pub use trading_session::{IterationOutcome, SessionSettings, TradingSession};
