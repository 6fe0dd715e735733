//! Entry level value objects.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::signal::Crossing;

/// Which side of an instruction a crossing triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySide {
    /// Entered on a rising crossing (calls, or long stock).
    Rising,
    /// Entered on a falling crossing (puts, or short stock).
    Falling,
}

impl EntrySide {
    /// The side a crossing triggers, if any.
    #[must_use]
    pub const fn from_crossing(crossing: Crossing) -> Option<Self> {
        match crossing {
            Crossing::Rising => Some(Self::Rising),
            Crossing::Falling => Some(Self::Falling),
            Crossing::None => None,
        }
    }

    /// Column prefix in the instruction file.
    #[must_use]
    pub const fn column_prefix(self) -> &'static str {
        match self {
            Self::Rising => "call",
            Self::Falling => "put",
        }
    }
}

impl fmt::Display for EntrySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_entry", self.column_prefix())
    }
}

/// Level and derivative selection for one entry side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryLevel {
    /// Price level whose crossing triggers the entry.
    pub threshold: Decimal,
    /// Option strike (options mode).
    pub strike: Option<Decimal>,
    /// Option expiration (options mode).
    pub expiration: Option<NaiveDate>,
}

impl EntryLevel {
    /// Level that trades the underlying.
    #[must_use]
    pub const fn underlying(threshold: Decimal) -> Self {
        Self {
            threshold,
            strike: None,
            expiration: None,
        }
    }

    /// Level that trades an option with the given strike and expiration.
    #[must_use]
    pub const fn option(threshold: Decimal, strike: Decimal, expiration: NaiveDate) -> Self {
        Self {
            threshold,
            strike: Some(strike),
            expiration: Some(expiration),
        }
    }
}
