//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.

mod state_change;
mod symbol;
mod timestamp;

pub use state_change::StateChange;
pub use symbol::Symbol;
pub use timestamp::{VenueTime, compact_stamp, log_stamp};
