//! Contract descriptors and resolved contracts.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::Symbol;

/// Option right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionRight {
    /// Call option.
    Call,
    /// Put option.
    Put,
}

impl fmt::Display for OptionRight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => write!(f, "C"),
            Self::Put => write!(f, "P"),
        }
    }
}

/// Logical descriptor handed to the venue for resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractSpec {
    /// A stock.
    Stock {
        /// Underlying symbol.
        symbol: Symbol,
        /// Trading currency.
        currency: String,
        /// Routing exchange.
        exchange: String,
    },
    /// An option on a stock.
    Option {
        /// Underlying symbol.
        symbol: Symbol,
        /// Trading currency.
        currency: String,
        /// Routing exchange.
        exchange: String,
        /// Call or put.
        right: OptionRight,
        /// Strike price.
        strike: Decimal,
        /// Last trading date.
        expiration: NaiveDate,
    },
}

impl ContractSpec {
    /// Stock descriptor.
    #[must_use]
    pub fn stock(symbol: Symbol, currency: impl Into<String>, exchange: impl Into<String>) -> Self {
        Self::Stock {
            symbol,
            currency: currency.into(),
            exchange: exchange.into(),
        }
    }

    /// Underlying symbol of the descriptor.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        match self {
            Self::Stock { symbol, .. } | Self::Option { symbol, .. } => symbol,
        }
    }
}

impl fmt::Display for ContractSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stock {
                symbol, exchange, ..
            } => write!(f, "STK {symbol}@{exchange}"),
            Self::Option {
                symbol,
                exchange,
                right,
                strike,
                expiration,
                ..
            } => write!(
                f,
                "OPT {symbol} {} {strike}{right}@{exchange}",
                expiration.format("%Y%m%d")
            ),
        }
    }
}

/// Security type of a resolved contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractKind {
    /// A stock.
    Stock,
    /// An option.
    Option {
        /// Call or put.
        right: OptionRight,
        /// Strike price.
        strike: Decimal,
        /// Last trading date.
        expiration: NaiveDate,
    },
}

/// Tick rule id the venue applies on one exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketRuleRef {
    /// Exchange the rule applies to.
    pub exchange: String,
    /// Venue rule table id.
    pub rule_id: i32,
}

/// A contract the venue resolved unambiguously.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// Venue contract id.
    pub con_id: i64,
    /// Underlying symbol.
    pub symbol: Symbol,
    /// Venue-local symbol (e.g. OCC symbol for options).
    pub local_symbol: String,
    /// Security type.
    pub kind: ContractKind,
    /// Trading currency.
    pub currency: String,
    /// Routing exchange.
    pub exchange: String,
    /// Contract multiplier (1 for stock).
    pub multiplier: Decimal,
    /// Tick rule ids per valid exchange.
    pub market_rules: Vec<MarketRuleRef>,
}

impl Contract {
    /// Rule id for `exchange`, falling back to the first listed rule.
    #[must_use]
    pub fn rule_id_for(&self, exchange: &str) -> Option<i32> {
        self.market_rules
            .iter()
            .find(|r| r.exchange == exchange)
            .or_else(|| self.market_rules.first())
            .map(|r| r.rule_id)
    }

    /// Distinct rule ids referenced by this contract.
    #[must_use]
    pub fn rule_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.market_rules.iter().map(|r| r.rule_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Whether this is an option contract.
    #[must_use]
    pub const fn is_option(&self) -> bool {
        matches!(self.kind, ContractKind::Option { .. })
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.local_symbol, self.con_id)
    }
}
