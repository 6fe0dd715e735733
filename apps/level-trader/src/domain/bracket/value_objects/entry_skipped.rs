//! Reasons an entry signal does not produce a bracket.

use std::fmt;

use rust_decimal::Decimal;

/// Why an entry was not taken. The instrument stays eligible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySkipped {
    /// Bid or ask missing or not positive.
    InvalidQuote,
    /// Spread relative to last price exceeds the stop fraction.
    SpreadTooWide {
        /// Observed spread / last.
        ratio: Decimal,
        /// Allowed maximum (stop fraction).
        limit: Decimal,
    },
    /// The notional amount does not buy a single unit.
    SizeTooSmall {
        /// Notional amount.
        amount: Decimal,
        /// Cost of one unit (price x multiplier).
        unit_cost: Decimal,
    },
    /// The traded contract reports a multiplier that is not positive.
    InvalidMultiplier {
        /// Venue-local symbol of the contract.
        local_symbol: String,
        /// Reported multiplier.
        multiplier: Decimal,
    },
    /// The traded contract could not be resolved unambiguously.
    NoValidDerivative {
        /// Descriptor that failed to resolve.
        descriptor: String,
    },
}

impl fmt::Display for EntrySkipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidQuote => write!(f, "bid or ask not positive"),
            Self::SpreadTooWide { ratio, limit } => {
                write!(f, "spread/last {ratio} exceeds stop fraction {limit}")
            }
            Self::SizeTooSmall { amount, unit_cost } => {
                write!(f, "unit cost {unit_cost} too expensive for amount {amount}")
            }
            Self::InvalidMultiplier {
                local_symbol,
                multiplier,
            } => write!(f, "multiplier {multiplier} of {local_symbol} is not positive"),
            Self::NoValidDerivative { descriptor } => {
                write!(f, "no unambiguous contract for {descriptor}")
            }
        }
    }
}
