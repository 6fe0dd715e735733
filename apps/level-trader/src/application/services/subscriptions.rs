//! Subscription Registry
//!
//! Market-data handles opened per instrument: the quote stream, the daily
//! regular-hours bars and the intraday extended-hours bars.

use std::collections::BTreeMap;

use crate::application::ports::{BarSeriesId, VenueError, VenuePort};
use crate::domain::market::{BarRequest, BarSize, Contract};
use crate::domain::shared::Symbol;

/// Handles opened for one instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Streamed contract.
    pub contract: Contract,
    /// Daily regular-hours bars.
    pub daily: BarSeriesId,
    /// Intraday bars including extended hours.
    pub intraday: BarSeriesId,
}

/// Open subscriptions keyed by underlying symbol.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    entries: BTreeMap<Symbol, Subscription>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `symbol` is subscribed.
    #[must_use]
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.entries.contains_key(symbol)
    }

    /// Handles of `symbol`.
    #[must_use]
    pub fn get(&self, symbol: &Symbol) -> Option<&Subscription> {
        self.entries.get(symbol)
    }

    /// Symbol whose intraday series is `series`.
    #[must_use]
    pub fn symbol_for_intraday(&self, series: BarSeriesId) -> Option<&Symbol> {
        self.entries
            .iter()
            .find(|(_, sub)| sub.intraday == series)
            .map(|(symbol, _)| symbol)
    }

    /// Number of subscribed instruments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Open quotes, daily bars and intraday bars for `contract`.
    ///
    /// Returns `Ok(false)` without touching the venue if `symbol` is already subscribed.
    ///
    /// # Errors
    ///
    /// Returns the first venue error. Handles opened before the failure are
    /// canceled best-effort.
    pub async fn subscribe<V: VenuePort + ?Sized>(
        &mut self,
        venue: &V,
        symbol: &Symbol,
        contract: &Contract,
        intraday: BarSize,
    ) -> Result<bool, VenueError> {
        if self.contains(symbol) {
            return Ok(false);
        }

        let daily = venue
            .request_bars(contract, BarRequest::daily_regular())
            .await?;
        tracing::debug!(symbol = %symbol, series = %daily, bars = venue.bars(daily).len(), "Daily regular-hours bars at start");

        if let Err(e) = venue.subscribe_quotes(contract).await {
            let _ = venue.cancel_bars(daily).await;
            return Err(e);
        }
        tracing::debug!(symbol = %symbol, "Quote stream started");

        let intraday = match venue
            .request_bars(contract, BarRequest::intraday_extended(intraday))
            .await
        {
            Ok(series) => series,
            Err(e) => {
                let _ = venue.cancel_bars(daily).await;
                let _ = venue.cancel_quotes(contract).await;
                return Err(e);
            }
        };
        tracing::debug!(symbol = %symbol, series = %intraday, bars = venue.bars(intraday).len(), "Intraday bars at start");

        self.entries.insert(
            symbol.clone(),
            Subscription {
                contract: contract.clone(),
                daily,
                intraday,
            },
        );
        Ok(true)
    }

    /// Cancel every handle, one by one, then forget them all.
    ///
    /// A failed cancellation is logged and does not stop the others.
    /// Returns the number of failed cancellations.
    pub async fn cancel_all<V: VenuePort + ?Sized>(&mut self, venue: &V) -> usize {
        let mut failures = 0;

        for (symbol, sub) in &self.entries {
            if let Err(e) = venue.cancel_quotes(&sub.contract).await {
                tracing::warn!(symbol = %symbol, error = %e, "Quote cancellation failed during recovery");
                failures += 1;
            }
            if let Err(e) = venue.cancel_bars(sub.daily).await {
                tracing::warn!(symbol = %symbol, error = %e, "Daily bar cancellation failed during recovery");
                failures += 1;
            }
            if let Err(e) = venue.cancel_bars(sub.intraday).await {
                tracing::warn!(symbol = %symbol, error = %e, "Intraday bar cancellation failed during recovery");
                failures += 1;
            }
        }

        self.entries.clear();
        failures
    }
}
