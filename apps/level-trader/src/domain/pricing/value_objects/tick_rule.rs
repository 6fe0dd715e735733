//! Tick Rule Value Objects

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::pricing::errors::TickRuleError;
use crate::domain::pricing::services::legalize;

/// One band of a venue's minimum-increment table.
///
/// The increment applies to prices whose magnitude is at or above `threshold`
/// and below the next band's threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRule {
    /// Lower edge of the band.
    pub threshold: Decimal,
    /// Minimum legal price increment within the band.
    pub increment: Decimal,
}

impl TickRule {
    /// Create a new tick rule.
    #[must_use]
    pub const fn new(threshold: Decimal, increment: Decimal) -> Self {
        Self {
            threshold,
            increment,
        }
    }
}

/// A validated tick rule table, sorted ascending by threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRuleTable {
    rules: Vec<TickRule>,
}

impl TickRuleTable {
    /// Build a table from venue rules.
    ///
    /// Rules are sorted by threshold, so a venue delivering them out of
    /// order yields the same table as one delivering them sorted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRuleTable` if the table is empty or an increment is not
    /// strictly positive.
    pub fn new(mut rules: Vec<TickRule>) -> Result<Self, TickRuleError> {
        if rules.is_empty() {
            return Err(TickRuleError::InvalidRuleTable {
                reason: "rule table is empty".to_string(),
            });
        }
        if let Some(bad) = rules.iter().find(|r| r.increment <= Decimal::ZERO) {
            return Err(TickRuleError::InvalidRuleTable {
                reason: format!(
                    "increment {} at threshold {} is not positive",
                    bad.increment, bad.threshold
                ),
            });
        }
        rules.sort_by(|a, b| a.threshold.cmp(&b.threshold));
        Ok(Self { rules })
    }

    /// Table with a single increment applying to every price.
    #[must_use]
    pub fn uniform(increment: Decimal) -> Self {
        Self {
            rules: vec![TickRule::new(Decimal::ZERO, increment)],
        }
    }

    /// Rules in ascending threshold order.
    #[must_use]
    pub fn rules(&self) -> &[TickRule] {
        &self.rules
    }

    /// Legalize a raw price against this table.
    ///
    /// # Errors
    ///
    /// Returns `NoApplicableRule` if the price is below every threshold.
    pub fn legalize(&self, raw: Decimal) -> Result<Decimal, TickRuleError> {
        legalize(raw, &self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn tick_rule_table_rejects_empty() {
        let result = TickRuleTable::new(vec![]);
        assert!(matches!(
            result,
            Err(TickRuleError::InvalidRuleTable { .. })
        ));
    }

    #[test]
    fn tick_rule_table_rejects_zero_increment() {
        let result = TickRuleTable::new(vec![TickRule::new(dec!(0), dec!(0))]);
        assert!(matches!(
            result,
            Err(TickRuleError::InvalidRuleTable { .. })
        ));
    }

    #[test]
    fn tick_rule_table_sorts_rules() {
        let table = TickRuleTable::new(vec![
            TickRule::new(dec!(3), dec!(0.10)),
            TickRule::new(dec!(0), dec!(0.05)),
        ])
        .unwrap();

        assert_eq!(table.rules()[0].threshold, dec!(0));
        assert_eq!(table.rules()[1].threshold, dec!(3));
    }

    #[test]
    fn tick_rule_table_out_of_order_legalizes_like_sorted() {
        let sorted = TickRuleTable::new(vec![
            TickRule::new(dec!(0), dec!(0.01)),
            TickRule::new(dec!(1), dec!(0.05)),
        ])
        .unwrap();
        let shuffled = TickRuleTable::new(vec![
            TickRule::new(dec!(1), dec!(0.05)),
            TickRule::new(dec!(0), dec!(0.01)),
        ])
        .unwrap();

        assert_eq!(shuffled, sorted);
        assert_eq!(shuffled.legalize(dec!(1.03)).unwrap(), dec!(1.05));
    }

    #[test]
    fn tick_rule_table_uniform() {
        let table = TickRuleTable::uniform(dec!(0.01));
        assert_eq!(table.legalize(dec!(1.888)).unwrap(), dec!(1.89));
    }
}
