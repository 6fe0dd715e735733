//! Tick Rule Bounded Context
//!
//! Venue price legalization. A venue publishes a piecewise table of minimum
//! price increments; every stop and limit price sent to the venue must be a
//! multiple of the increment that applies to its magnitude.

pub mod errors;
pub mod services;
pub mod value_objects;

pub use errors::TickRuleError;
pub use services::legalize;
pub use value_objects::{TickRule, TickRuleTable};
