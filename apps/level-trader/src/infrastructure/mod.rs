//! Infrastructure Layer
//!
//! Adapters implementing the ports defined in the application layer:
//!
//! - `venue/`: Paper venue and its market document
//! - `calendar`: Trading-day lookups from the venue's liquid hours
//! - `instructions`: YAML instruction file with change detection

pub mod calendar;
pub mod instructions;
pub mod venue;

pub use calendar::TradingHoursCalendar;
pub use instructions::{InstructionDocument, YamlInstructionSource, parse_instructions};
pub use venue::{
    PaperListing, PaperMarket, PaperMarketError, PaperOperation, PaperOrder, PaperRuleTable,
    PaperVenue, PaperVenueConfig, ReplayStep,
};
