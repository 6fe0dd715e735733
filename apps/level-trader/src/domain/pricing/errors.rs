//! Tick Rule Errors

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while legalizing a price.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TickRuleError {
    /// The rule table cannot be used.
    #[error("Invalid tick rule table: {reason}")]
    InvalidRuleTable {
        /// Why the table was rejected.
        reason: String,
    },

    /// No rule threshold is at or below the price magnitude.
    #[error("No tick rule applies to price {price}")]
    NoApplicableRule {
        /// The price that could not be legalized.
        price: Decimal,
    },
}
