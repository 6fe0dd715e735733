//! Application Ports (Driven)
//!
//! Ports define interfaces for interacting with external systems: the
//! execution venue, the market calendar and the instruction source.

mod instruction_source_port;
mod market_calendar_port;
mod venue_port;

pub use instruction_source_port::{
    InMemoryInstructionSource, InstructionSourceError, InstructionSourcePort,
};
pub use market_calendar_port::{CalendarError, MarketCalendarPort};
pub use venue_port::{
    BarSeriesId, OrderState, OrderStatus, VenueError, VenueEvent, VenuePort,
};
