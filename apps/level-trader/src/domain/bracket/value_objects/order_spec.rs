//! Order leg specifications.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::VenueTime;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    /// Buy order.
    Buy,
    /// Sell order.
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type with its price parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Market order.
    Market,
    /// Stop order that becomes a market order once `trigger` trades.
    Stop {
        /// Trigger price.
        trigger: Decimal,
    },
    /// Limit order.
    Limit {
        /// Limit price.
        limit: Decimal,
    },
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "MKT"),
            Self::Stop { trigger } => write!(f, "STP {trigger}"),
            Self::Limit { limit } => write!(f, "LMT {limit}"),
        }
    }
}

/// Role of a leg inside a bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegRole {
    /// Opening market order.
    Entry,
    /// Protective stop.
    StopExit,
    /// Profit target.
    TargetExit,
    /// Flatten at the time boundary.
    TimeExit,
}

impl LegRole {
    /// Prefix used in order references.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::StopExit => "stop_exit",
            Self::TargetExit => "target_exit",
            Self::TimeExit => "time_exit",
        }
    }
}

impl fmt::Display for LegRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// How the venue treats siblings once one member of a group fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OcaKind {
    /// Cancel all remaining siblings on the first fill.
    CancelWithBlock,
    /// Reduce siblings' remaining quantity by each fill, with overfill protection.
    ReduceWithBlock,
    /// Reduce siblings' remaining quantity by each fill, without overfill protection.
    ReduceWithoutBlock,
}

impl OcaKind {
    /// Numeric code the venue uses for this behaviour.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::CancelWithBlock => 1,
            Self::ReduceWithBlock => 2,
            Self::ReduceWithoutBlock => 3,
        }
    }
}

/// A one-cancels-all group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcaGroup {
    /// Group name, unique per instrument and timestamp.
    pub name: String,
    /// Sibling handling.
    pub kind: OcaKind,
}

/// One order leg ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Role in the bracket.
    pub role: LegRole,
    /// Buy or sell.
    pub side: OrderSide,
    /// Order type.
    pub kind: OrderKind,
    /// Quantity in contracts or shares.
    pub quantity: Decimal,
    /// Human readable order reference.
    pub order_ref: String,
    /// Target account.
    pub account: String,
    /// Identifier shared by all legs of the bracket.
    pub bracket_ref: String,
    /// One-cancels-all membership (exit legs only).
    pub oca: Option<OcaGroup>,
    /// Earliest activation time.
    pub good_after: Option<VenueTime>,
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} [{}]", self.side, self.quantity, self.kind, self.order_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn order_side_opposite() {
        assert_eq!(OrderSide::Buy.opposite(), OrderSide::Sell);
        assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
    }

    #[test]
    fn leg_role_prefixes() {
        assert_eq!(LegRole::Entry.prefix(), "entry");
        assert_eq!(LegRole::StopExit.prefix(), "stop_exit");
        assert_eq!(LegRole::TargetExit.prefix(), "target_exit");
        assert_eq!(LegRole::TimeExit.to_string(), "time_exit");
    }

    #[test]
    fn oca_kind_codes() {
        assert_eq!(OcaKind::CancelWithBlock.code(), 1);
        assert_eq!(OcaKind::ReduceWithBlock.code(), 2);
        assert_eq!(OcaKind::ReduceWithoutBlock.code(), 3);
    }

    #[test]
    fn order_spec_display() {
        let spec = OrderSpec {
            role: LegRole::StopExit,
            side: OrderSide::Sell,
            kind: OrderKind::Stop { trigger: dec!(4.5) },
            quantity: dec!(2),
            order_ref: "stop_exit_trader_SPY_20240315_100000".to_string(),
            account: "DU123".to_string(),
            bracket_ref: "oca_trader_SPY_20240315_100000".to_string(),
            oca: None,
            good_after: None,
        };
        assert_eq!(
            spec.to_string(),
            "SELL 2 STP 4.5 [stop_exit_trader_SPY_20240315_100000]"
        );
    }
}
