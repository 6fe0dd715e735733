//! Price Legalization
//!
//! Snaps a raw price onto the venue's tick grid.

use rust_decimal::Decimal;

use crate::domain::pricing::errors::TickRuleError;
use crate::domain::pricing::value_objects::TickRule;

/// Decimal places every legalized price is quantized to.
const PRICE_DECIMALS: u32 = 4;

/// Legalize a raw price against a tick rule table.
///
/// The increment is taken from the rule with the greatest threshold at or
/// below `|raw|`. The price is snapped to the nearest multiple of that
/// increment (ties go to the even multiple) and then quantized to four
/// decimal places, so comparisons against venue-reported prices are exact.
///
/// # Errors
///
/// - `InvalidRuleTable` if `rules` is empty or the selected increment is not positive.
/// - `NoApplicableRule` if every threshold is above `|raw|`.
pub fn legalize(raw: Decimal, rules: &[TickRule]) -> Result<Decimal, TickRuleError> {
    if rules.is_empty() {
        return Err(TickRuleError::InvalidRuleTable {
            reason: "rule table is empty".to_string(),
        });
    }

    let magnitude = raw.abs();
    let rule = rules
        .iter()
        .filter(|r| r.threshold <= magnitude)
        .max_by_key(|r| r.threshold)
        .ok_or(TickRuleError::NoApplicableRule { price: raw })?;

    if rule.increment <= Decimal::ZERO {
        return Err(TickRuleError::InvalidRuleTable {
            reason: format!("increment {} is not positive", rule.increment),
        });
    }

    let snapped = (raw / rule.increment).round() * rule.increment;
    Ok(snapped.round_dp(PRICE_DECIMALS).normalize())
}
