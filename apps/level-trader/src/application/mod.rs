//! Application Layer
//!
//! The application layer orchestrates domain logic against the outside world.
//! It defines:
//!
//! - **Ports**: Interfaces for the venue, the market calendar and the instruction source
//! - **Services**: The trading session iteration and its reconnection supervisor

pub mod ports;
pub mod services;

pub use ports::*;
pub use services::*;
