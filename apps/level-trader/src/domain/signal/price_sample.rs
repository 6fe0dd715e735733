//! Previous/current last-trade price pair.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Crossing, cross};

/// The last two sampled last-trade prices of an instrument.
///
/// A sample is `None` until the venue has reported a trade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSample {
    /// Price at the previous iteration.
    pub previous: Option<Decimal>,
    /// Price at the current iteration.
    pub current: Option<Decimal>,
}

impl PriceSample {
    /// Start sampling from an initial price.
    #[must_use]
    pub const fn starting_at(current: Option<Decimal>) -> Self {
        Self {
            previous: None,
            current,
        }
    }

    /// Shift the current price into previous, then store `latest`.
    pub const fn advance(&mut self, latest: Option<Decimal>) {
        self.previous = self.current;
        self.current = latest;
    }

    /// Crossing of `threshold` between the two samples.
    ///
    /// Reports `None` while either sample is missing.
    #[must_use]
    pub fn crossing(&self, threshold: Decimal) -> Crossing {
        match (self.previous, self.current) {
            (Some(previous), Some(current)) => cross(previous, current, threshold),
            _ => Crossing::None,
        }
    }
}
