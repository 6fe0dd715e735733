//! Venue adapters
//!
//! - `market`: the YAML document describing a paper market
//! - `paper`: an in-process venue with a simulated clock and order matching

mod market;
mod paper;

pub use market::{PaperListing, PaperMarket, PaperMarketError, PaperRuleTable, ReplayStep};
pub use paper::{PaperOperation, PaperOrder, PaperVenue, PaperVenueConfig};
