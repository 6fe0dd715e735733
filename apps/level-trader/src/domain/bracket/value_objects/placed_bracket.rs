//! Handles of orders accepted by the venue.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::BracketOrder;
use crate::domain::market::Contract;

/// Venue handle of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderHandle {
    /// Venue-assigned order id.
    pub order_id: i64,
    /// Order reference sent with the order.
    pub order_ref: String,
}

impl fmt::Display for OrderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.order_id, self.order_ref)
    }
}

/// A bracket whose entry has filled and whose exits are working.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedBracket {
    /// The composed bracket.
    pub order: BracketOrder,
    /// Contract the legs trade.
    pub contract: Contract,
    /// Entry leg.
    pub entry: OrderHandle,
    /// Protective stop leg.
    pub stop_exit: OrderHandle,
    /// Profit target leg.
    pub target_exit: OrderHandle,
    /// Time exit leg.
    pub time_exit: OrderHandle,
}
