//! Venue Port (Driven Port)
//!
//! Interface to the execution venue: connection, contracts, market data,
//! orders and the notifications the venue pushes back.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::bracket::{OrderHandle, OrderSpec};
use crate::domain::ledger::{CommissionReport, FillReport};
use crate::domain::market::{Bar, BarRequest, Contract, ContractSpec, Quote, TradingHours};
use crate::domain::pricing::TickRuleTable;
use crate::domain::shared::VenueTime;

/// Identifier of a kept-up-to-date bar series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BarSeriesId(pub i64);

impl fmt::Display for BarSeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bars#{}", self.0)
    }
}

/// Lifecycle of an order at the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    /// Accepted but not yet active (e.g. before its good-after time).
    PreSubmitted,
    /// Working.
    Submitted,
    /// Completely filled.
    Filled,
    /// Canceled, including by a one-cancels-all sibling.
    Cancelled,
}

impl OrderState {
    /// Returns true if the order can no longer fill.
    #[must_use]
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled)
    }
}

/// Venue view of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatus {
    /// Order state.
    pub state: OrderState,
    /// Quantity filled so far.
    pub filled: Decimal,
    /// Quantity still working.
    pub remaining: Decimal,
    /// Average fill price, once anything filled.
    pub avg_fill_price: Option<Decimal>,
}

/// Notifications pushed by the venue between pumps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VenueEvent {
    /// An execution. May be delivered more than once.
    Fill(FillReport),
    /// Commission of an execution. May be delivered more than once.
    Commission(CommissionReport),
    /// A kept-up-to-date bar series changed.
    BarUpdate {
        /// Series that changed.
        series: BarSeriesId,
        /// Whether a new bar started.
        has_new_bar: bool,
    },
    /// The connection has been idle for too long.
    Timeout {
        /// Idle period.
        idle: Duration,
    },
    /// An error reported by the venue, possibly tied to a contract.
    Error {
        /// Venue error code.
        code: i32,
        /// Local symbol the error refers to.
        symbol: Option<String>,
        /// Error text.
        message: String,
    },
}

/// Venue port errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VenueError {
    /// No connection to the venue.
    #[error("Not connected to the venue")]
    NotConnected,

    /// The connection dropped during a request.
    #[error("Venue connection lost: {message}")]
    ConnectionLost {
        /// Error details.
        message: String,
    },

    /// A request timed out.
    #[error("Venue request timed out: {operation}")]
    Timeout {
        /// Operation that timed out.
        operation: String,
    },

    /// More than one contract matches the descriptor.
    #[error("Ambiguous contract {descriptor}: {matches} matches")]
    Ambiguous {
        /// Descriptor that was resolved.
        descriptor: String,
        /// Number of matches.
        matches: usize,
    },

    /// No contract matches the descriptor.
    #[error("No contract found for {descriptor}")]
    NotFound {
        /// Descriptor that was resolved.
        descriptor: String,
    },

    /// An order was rejected.
    #[error("Order {order_ref} rejected: {reason}")]
    Rejected {
        /// Reference of the rejected order.
        order_ref: String,
        /// Rejection reason.
        reason: String,
    },

    /// Missing market-data permission.
    #[error("Subscription denied for {symbol}: {message}")]
    SubscriptionDenied {
        /// Symbol of the subscription.
        symbol: String,
        /// Error details.
        message: String,
    },

    /// Any other failed request.
    #[error("Venue request failed: {message}")]
    Request {
        /// Error details.
        message: String,
    },
}

impl VenueError {
    /// Returns true if the error means the descriptor has no unambiguous contract.
    #[must_use]
    pub const fn is_unresolvable(&self) -> bool {
        matches!(self, Self::Ambiguous { .. } | Self::NotFound { .. })
    }
}

/// Port for the execution venue.
///
/// Pull-style accessors (`quote`, `bars`, `order_status`, `drain_events`)
/// report what the venue delivered up to the last `pump`.
#[async_trait]
pub trait VenuePort: Send + Sync {
    /// Open the connection.
    async fn connect(&self) -> Result<(), VenueError>;

    /// Close the connection. Never fails.
    async fn disconnect(&self);

    /// Returns true while connected.
    fn is_connected(&self) -> bool;

    /// Accounts the session may trade.
    async fn managed_accounts(&self) -> Result<Vec<String>, VenueError>;

    /// Venue clock, in venue-local time.
    async fn current_time(&self) -> Result<VenueTime, VenueError>;

    /// Resolve a descriptor to exactly one contract.
    async fn resolve_contract(&self, spec: &ContractSpec) -> Result<Contract, VenueError>;

    /// Trading hours of a contract.
    async fn trading_hours(&self, contract: &Contract) -> Result<TradingHours, VenueError>;

    /// Minimum price increment table for a market rule.
    async fn tick_rules(&self, rule_id: i32) -> Result<TickRuleTable, VenueError>;

    /// Start streaming quotes.
    async fn subscribe_quotes(&self, contract: &Contract) -> Result<(), VenueError>;

    /// Stop streaming quotes.
    async fn cancel_quotes(&self, contract: &Contract) -> Result<(), VenueError>;

    /// Latest quote of a subscribed contract.
    fn quote(&self, contract: &Contract) -> Option<Quote>;

    /// Request a bar series kept up to date by the venue.
    async fn request_bars(
        &self,
        contract: &Contract,
        request: BarRequest,
    ) -> Result<BarSeriesId, VenueError>;

    /// Stop updating a bar series.
    async fn cancel_bars(&self, series: BarSeriesId) -> Result<(), VenueError>;

    /// Bars of a series, oldest first. The last bar may still be forming.
    fn bars(&self, series: BarSeriesId) -> Vec<Bar>;

    /// Submit an order.
    async fn place_order(
        &self,
        contract: &Contract,
        order: &OrderSpec,
    ) -> Result<OrderHandle, VenueError>;

    /// Cancel an order.
    async fn cancel_order(&self, handle: &OrderHandle) -> Result<(), VenueError>;

    /// Venue view of an order.
    fn order_status(&self, handle: &OrderHandle) -> Option<OrderStatus>;

    /// Process incoming venue traffic for at most `max_wait`.
    async fn pump(&self, max_wait: Duration) -> Result<(), VenueError>;

    /// Take the notifications received since the last drain.
    fn drain_events(&self) -> Vec<VenueEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_error_unresolvable() {
        assert!(
            VenueError::Ambiguous {
                descriptor: "OPT X".to_string(),
                matches: 2,
            }
            .is_unresolvable()
        );
        assert!(
            VenueError::NotFound {
                descriptor: "OPT X".to_string(),
            }
            .is_unresolvable()
        );
        assert!(!VenueError::NotConnected.is_unresolvable());
    }

    #[test]
    fn venue_error_display() {
        let err = VenueError::SubscriptionDenied {
            symbol: "X".to_string(),
            message: "no market data permissions".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Subscription denied for X: no market data permissions"
        );
    }

    #[test]
    fn order_state_done() {
        assert!(OrderState::Filled.is_done());
        assert!(OrderState::Cancelled.is_done());
        assert!(!OrderState::PreSubmitted.is_done());
        assert!(!OrderState::Submitted.is_done());
    }
}
