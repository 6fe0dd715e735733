//! Trading mode value object.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::instruction::InstructionError;

/// What an instruction trades when its level is crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradingMode {
    /// Trade the underlying stock itself.
    Stocks,
    /// Trade an option on the underlying.
    Options,
}

impl FromStr for TradingMode {
    type Err = InstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STOCKS" => Ok(Self::Stocks),
            "OPTIONS" => Ok(Self::Options),
            "" => Err(InstructionError::MissingField { field: "trading" }),
            other => Err(InstructionError::OutOfRange {
                field: "trading",
                value: other.to_string(),
                rule: "trading is STOCKS or OPTIONS",
            }),
        }
    }
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stocks => write!(f, "STOCKS"),
            Self::Options => write!(f, "OPTIONS"),
        }
    }
}
