//! Quote snapshot value object.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Latest top-of-book and last-trade snapshot for a contract.
///
/// A field is `None` until the venue has reported it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Best bid price.
    pub bid: Option<Decimal>,
    /// Best ask price.
    pub ask: Option<Decimal>,
    /// Last trade price.
    pub last: Option<Decimal>,
}

impl Quote {
    /// Create a fully populated quote.
    #[must_use]
    pub const fn new(bid: Decimal, ask: Decimal, last: Decimal) -> Self {
        Self {
            bid: Some(bid),
            ask: Some(ask),
            last: Some(last),
        }
    }

    /// Quote carrying only a last trade price.
    #[must_use]
    pub const fn last_only(last: Decimal) -> Self {
        Self {
            bid: None,
            ask: None,
            last: Some(last),
        }
    }

    /// Bid and ask, if both are strictly positive.
    #[must_use]
    pub fn tradable_book(&self) -> Option<(Decimal, Decimal)> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) if bid > Decimal::ZERO && ask > Decimal::ZERO => {
                Some((bid, ask))
            }
            _ => None,
        }
    }

    /// Absolute bid/ask spread.
    #[must_use]
    pub fn spread(&self) -> Option<Decimal> {
        self.tradable_book().map(|(bid, ask)| (ask - bid).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn quote_tradable_book() {
        let quote = Quote::new(dec!(4.90), dec!(5.00), dec!(5.00));
        assert_eq!(quote.tradable_book(), Some((dec!(4.90), dec!(5.00))));
        assert_eq!(quote.spread(), Some(dec!(0.10)));
    }

    #[test]
    fn quote_without_book() {
        let quote = Quote::last_only(dec!(100));
        assert_eq!(quote.tradable_book(), None);

        let quote = Quote::new(dec!(-1), dec!(5.00), dec!(5.00));
        assert_eq!(quote.tradable_book(), None);
        assert_eq!(quote.spread(), None);
    }
}
