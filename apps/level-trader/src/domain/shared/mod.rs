//! Shared Domain Types
//!
//! Value objects and errors shared across bounded contexts.

pub mod errors;
pub mod value_objects;

pub use errors::{DomainError, TransitionError};
pub use value_objects::{StateChange, Symbol, VenueTime, compact_stamp, log_stamp};
