//! Market Data Errors

use thiserror::Error;

/// Errors raised while interpreting venue market data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    /// Bar size has no venue equivalent.
    #[error("Unsupported bar size of {seconds} seconds")]
    UnsupportedBarSize {
        /// Requested bar size.
        seconds: u32,
    },

    /// A trading hours field could not be parsed.
    #[error("Invalid trading hours field '{field}'")]
    InvalidTradingHours {
        /// The offending field.
        field: String,
    },
}
