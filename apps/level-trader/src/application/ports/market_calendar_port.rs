//! Market Calendar Port (Driven Port)
//!
//! Whether the venue trades on a date, and when.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::VenueError;
use crate::domain::market::{Contract, MarketDataError, TradingDay};

/// Market calendar errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    /// The venue request failed.
    #[error(transparent)]
    Venue(#[from] VenueError),

    /// The venue returned hours that could not be parsed.
    #[error(transparent)]
    Hours(#[from] MarketDataError),
}

/// Port for trading-day lookups.
#[async_trait]
pub trait MarketCalendarPort: Send + Sync {
    /// Session boundaries of `date` for a representative contract.
    async fn trading_day(
        &self,
        contract: &Contract,
        date: NaiveDate,
    ) -> Result<TradingDay, CalendarError>;
}
