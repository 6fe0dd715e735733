//! Trading-hours calendar
//!
//! Answers trading-day lookups from the venue's liquid-hours string of a
//! representative contract.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::application::ports::{CalendarError, MarketCalendarPort, VenuePort};
use crate::domain::market::{Contract, TradingDay};

/// Calendar backed by the venue's trading hours.
#[derive(Debug)]
pub struct TradingHoursCalendar<V: ?Sized> {
    venue: Arc<V>,
}

impl<V: ?Sized> TradingHoursCalendar<V> {
    /// Create a calendar asking `venue` for trading hours.
    #[must_use]
    pub const fn new(venue: Arc<V>) -> Self {
        Self { venue }
    }
}

#[async_trait]
impl<V: VenuePort + ?Sized> MarketCalendarPort for TradingHoursCalendar<V> {
    async fn trading_day(
        &self,
        contract: &Contract,
        date: NaiveDate,
    ) -> Result<TradingDay, CalendarError> {
        let hours = self.venue.trading_hours(contract).await?;
        tracing::debug!(contract = %contract, hours = %hours.liquid_hours, "Liquid hours");
        Ok(hours.trading_day(date)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::ContractSpec;
    use crate::domain::shared::Symbol;
    use crate::infrastructure::venue::{PaperListing, PaperVenue, PaperVenueConfig};
    use chrono::{DateTime, Timelike};

    async fn setup(hours: &str) -> (Arc<PaperVenue>, Contract) {
        let start = DateTime::parse_from_rfc3339("2024-03-15T08:00:00-04:00").unwrap();
        let venue = Arc::new(PaperVenue::new(PaperVenueConfig::starting_at(start)));
        venue.list(&PaperListing::stock(1, "XYZ", 26)).unwrap();
        venue.set_liquid_hours(hours);
        venue.connect().await.unwrap();
        let contract = venue
            .resolve_contract(&ContractSpec::stock(Symbol::new("XYZ"), "USD", "SMART"))
            .await
            .unwrap();
        (venue, contract)
    }

    #[tokio::test]
    async fn trading_day_open() {
        let (venue, contract) =
            setup("20240315:0930-20240315:1600;20240316:CLOSED").await;
        let calendar = TradingHoursCalendar::new(venue);

        let day = calendar
            .trading_day(&contract, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
            .await
            .unwrap();
        assert!(day.is_open);
        assert_eq!(day.open.unwrap().hour(), 9);
        assert_eq!(day.close.unwrap().hour(), 16);

        let day = calendar
            .trading_day(&contract, NaiveDate::from_ymd_opt(2024, 3, 16).unwrap())
            .await
            .unwrap();
        assert!(!day.is_open);
    }

    #[tokio::test]
    async fn trading_day_malformed_hours() {
        let (venue, contract) = setup("garbage").await;
        let calendar = TradingHoursCalendar::new(venue);

        let result = calendar
            .trading_day(&contract, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
            .await;
        assert!(matches!(result, Err(CalendarError::Hours(_))));
    }

    #[tokio::test]
    async fn trading_day_venue_failure() {
        let (venue, contract) = setup("20240315:0930-1600").await;
        venue.disconnect().await;
        let calendar = TradingHoursCalendar::new(venue);

        let result = calendar
            .trading_day(&contract, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
            .await;
        assert!(matches!(result, Err(CalendarError::Venue(_))));
    }
}
