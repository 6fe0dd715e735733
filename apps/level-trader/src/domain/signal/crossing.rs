//! Crossing detection.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Edge signal produced by comparing two consecutive prices with a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Crossing {
    /// Price moved from at-or-below the level to above it.
    Rising,
    /// Price moved from at-or-above the level to below it.
    Falling,
    /// No crossing between the two samples.
    None,
}

impl fmt::Display for Crossing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rising => write!(f, "RISING"),
            Self::Falling => write!(f, "FALLING"),
            Self::None => write!(f, "NONE"),
        }
    }
}

/// Classify the move from `previous` to `current` against `threshold`.
///
/// `Rising` iff `previous <= threshold < current`, `Falling` iff
/// `previous >= threshold > current`. A price that stays on one side of the
/// level reports `None`, so each crossing fires once.
#[must_use]
pub fn cross(previous: Decimal, current: Decimal, threshold: Decimal) -> Crossing {
    if previous <= threshold && threshold < current {
        Crossing::Rising
    } else if previous >= threshold && threshold > current {
        Crossing::Falling
    } else {
        Crossing::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    #[test_case(dec!(9.9), dec!(10.1), dec!(10.0), Crossing::Rising ; "rising through level")]
    #[test_case(dec!(10.1), dec!(9.9), dec!(10.0), Crossing::Falling ; "falling through level")]
    #[test_case(dec!(10.1), dec!(10.2), dec!(10.0), Crossing::None ; "staying above")]
    #[test_case(dec!(9.8), dec!(9.9), dec!(10.0), Crossing::None ; "staying below")]
    #[test_case(dec!(10.0), dec!(10.1), dec!(10.0), Crossing::Rising ; "leaving the level upward")]
    #[test_case(dec!(10.0), dec!(9.9), dec!(10.0), Crossing::Falling ; "leaving the level downward")]
    #[test_case(dec!(9.9), dec!(10.0), dec!(10.0), Crossing::None ; "touching from below")]
    #[test_case(dec!(10.1), dec!(10.0), dec!(10.0), Crossing::None ; "touching from above")]
    #[test_case(dec!(10.0), dec!(10.0), dec!(10.0), Crossing::None ; "flat at level")]
    fn cross_cases(previous: Decimal, current: Decimal, threshold: Decimal, expected: Crossing) {
        assert_eq!(cross(previous, current, threshold), expected);
    }

    #[test]
    fn crossing_display() {
        assert_eq!(Crossing::Rising.to_string(), "RISING");
        assert_eq!(Crossing::Falling.to_string(), "FALLING");
        assert_eq!(Crossing::None.to_string(), "NONE");
    }
}
