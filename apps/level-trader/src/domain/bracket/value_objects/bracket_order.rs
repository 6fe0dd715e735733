//! Bracket Order Value Object

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OcaGroup, OrderSide, OrderSpec};
use crate::domain::shared::VenueTime;

/// Position direction opened by a bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionDirection {
    /// Long position (buy to open).
    Long,
    /// Short position (sell to open).
    Short,
}

impl PositionDirection {
    /// Side of the opening order.
    #[must_use]
    pub const fn entry_side(self) -> OrderSide {
        match self {
            Self::Long => OrderSide::Buy,
            Self::Short => OrderSide::Sell,
        }
    }
}

/// An entry leg and its three linked exit legs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketOrder {
    /// Position direction.
    pub direction: PositionDirection,
    /// Number of units on every leg.
    pub size: Decimal,
    /// Price the stop and target were derived from (ask for long, bid for short).
    pub reference_price: Decimal,
    /// Market entry.
    pub entry: OrderSpec,
    /// Protective stop.
    pub stop_exit: OrderSpec,
    /// Profit target.
    pub target_exit: OrderSpec,
    /// Time-boundary market exit.
    pub time_exit: OrderSpec,
    /// Group joining the exit legs.
    pub group: OcaGroup,
    /// Activation time of the time exit.
    pub exit_time: VenueTime,
}

impl BracketOrder {
    /// Exit legs in submission order.
    #[must_use]
    pub const fn exits(&self) -> [&OrderSpec; 3] {
        [&self.stop_exit, &self.target_exit, &self.time_exit]
    }
}
