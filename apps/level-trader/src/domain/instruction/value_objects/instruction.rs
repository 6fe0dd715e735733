//! Instruction record and its raw row form.

use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::{Cell, EntryLevel, EntrySide, TradingMode};
use crate::domain::instruction::InstructionError;
use crate::domain::shared::Symbol;

/// Longest allowed flatten delay: a full regular session (6h30).
pub const MAX_FLATTEN_DELAY_MINUTES: u32 = 6 * 60 + 30;

/// One raw row of the instruction file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstructionRow {
    /// Underlying symbol.
    pub symbol: Option<Cell>,
    /// Currency of the underlying.
    pub currency: Option<Cell>,
    /// STOCKS or OPTIONS.
    pub trading: Option<Cell>,
    /// Notional amount to commit per entry.
    pub amount: Option<Cell>,
    /// Stop distance in percent of the entry price.
    pub stop: Option<Cell>,
    /// Target distance in percent of the entry price.
    pub target: Option<Cell>,
    /// Rising entry level.
    pub call_entry: Option<Cell>,
    /// Rising entry option strike.
    pub call_strike: Option<Cell>,
    /// Rising entry option expiration.
    pub call_exp: Option<Cell>,
    /// Falling entry level.
    pub put_entry: Option<Cell>,
    /// Falling entry option strike.
    pub put_strike: Option<Cell>,
    /// Falling entry option expiration.
    pub put_exp: Option<Cell>,
    /// Minutes before close at which entries stop and positions flatten.
    pub flat_delay: Option<Cell>,
}

impl InstructionRow {
    /// Trimmed symbol text, empty if absent.
    #[must_use]
    pub fn symbol_text(&self) -> String {
        Cell::text_of(self.symbol.as_ref())
    }
}

/// Validated per-instrument instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Underlying symbol.
    pub symbol: Symbol,
    /// Currency of the underlying.
    pub currency: String,
    /// What gets traded on a crossing.
    pub mode: TradingMode,
    /// Notional amount per entry (positive).
    pub amount: Decimal,
    /// Stop distance in percent (> 0).
    pub stop_pct: Decimal,
    /// Target distance in percent (> 0).
    pub target_pct: Decimal,
    /// Entry on a rising crossing, if configured.
    pub rising: Option<EntryLevel>,
    /// Entry on a falling crossing, if configured.
    pub falling: Option<EntryLevel>,
    /// Minutes before close at which entries stop, in `0..=390`.
    pub flatten_delay_minutes: u32,
}

impl Instruction {
    /// Stop distance as a fraction.
    #[must_use]
    pub fn stop_fraction(&self) -> Decimal {
        self.stop_pct / Decimal::ONE_HUNDRED
    }

    /// Target distance as a fraction.
    #[must_use]
    pub fn target_fraction(&self) -> Decimal {
        self.target_pct / Decimal::ONE_HUNDRED
    }

    /// Flatten delay as a duration.
    #[must_use]
    pub fn flatten_delay(&self) -> Duration {
        Duration::minutes(i64::from(self.flatten_delay_minutes))
    }

    /// Entry level for a side.
    #[must_use]
    pub const fn level(&self, side: EntrySide) -> Option<&EntryLevel> {
        match side {
            EntrySide::Rising => self.rising.as_ref(),
            EntrySide::Falling => self.falling.as_ref(),
        }
    }
}

impl TryFrom<&InstructionRow> for Instruction {
    type Error = InstructionError;

    fn try_from(row: &InstructionRow) -> Result<Self, Self::Error> {
        let symbol = Symbol::new(row.symbol_text());
        symbol
            .validate()
            .map_err(|e| InstructionError::InvalidSymbol {
                message: e.to_string(),
            })?;

        let currency = required_text(row.currency.as_ref(), "currency")?.to_uppercase();
        let mode = TradingMode::from_str(&Cell::text_of(row.trading.as_ref()))?;

        let amount = required_decimal(row.amount.as_ref(), "amount")?;
        if amount <= Decimal::ZERO {
            return Err(out_of_range("amount", amount, "amount > 0"));
        }
        let stop_pct = required_decimal(row.stop.as_ref(), "stop")?;
        if stop_pct <= Decimal::ZERO {
            return Err(out_of_range("stop", stop_pct, "stop > 0"));
        }
        let target_pct = required_decimal(row.target.as_ref(), "target")?;
        if target_pct <= Decimal::ZERO {
            return Err(out_of_range("target", target_pct, "target > 0"));
        }

        let rising = entry_level(
            mode,
            EntrySide::Rising,
            [&row.call_entry, &row.call_strike, &row.call_exp],
        )?;
        let falling = entry_level(
            mode,
            EntrySide::Falling,
            [&row.put_entry, &row.put_strike, &row.put_exp],
        )?;

        let delay = required_decimal(row.flat_delay.as_ref(), "flat_delay")?;
        let flatten_delay_minutes = delay
            .to_u32()
            .filter(|m| delay.fract().is_zero() && *m <= MAX_FLATTEN_DELAY_MINUTES)
            .ok_or_else(|| out_of_range("flat_delay", delay, "0 <= flat_delay <= 390 minutes"))?;

        Ok(Self {
            symbol,
            currency,
            mode,
            amount,
            stop_pct,
            target_pct,
            rising,
            falling,
            flatten_delay_minutes,
        })
    }
}

fn out_of_range(field: &'static str, value: Decimal, rule: &'static str) -> InstructionError {
    InstructionError::OutOfRange {
        field,
        value: value.to_string(),
        rule,
    }
}

fn required_text(cell: Option<&Cell>, field: &'static str) -> Result<String, InstructionError> {
    let text = Cell::text_of(cell);
    if text.is_empty() {
        return Err(InstructionError::MissingField { field });
    }
    Ok(text)
}

fn required_decimal(cell: Option<&Cell>, field: &'static str) -> Result<Decimal, InstructionError> {
    let text = required_text(cell, field)?;
    parse_decimal(&text, field)
}

fn parse_decimal(text: &str, field: &'static str) -> Result<Decimal, InstructionError> {
    Decimal::from_str(text).map_err(|_| InstructionError::Unparseable {
        field,
        value: text.to_string(),
    })
}

fn parse_date(text: &str, field: &'static str) -> Result<NaiveDate, InstructionError> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y%m%d"))
        .map_err(|_| InstructionError::Unparseable {
            field,
            value: text.to_string(),
        })
}

/// Build one entry side from its entry, strike and expiration cells.
///
/// All blank disables the side. Options mode needs all three cells; stocks
/// mode only needs the entry level.
fn entry_level(
    mode: TradingMode,
    side: EntrySide,
    cells: [&Option<Cell>; 3],
) -> Result<Option<EntryLevel>, InstructionError> {
    let [entry, strike, expiration] = cells.map(|c| Cell::text_of(c.as_ref()));
    let (entry_field, strike_field, exp_field) = match side {
        EntrySide::Rising => ("call_entry", "call_strike", "call_exp"),
        EntrySide::Falling => ("put_entry", "put_strike", "put_exp"),
    };

    if entry.is_empty() && strike.is_empty() && expiration.is_empty() {
        return Ok(None);
    }
    let all_filled = !entry.is_empty() && !strike.is_empty() && !expiration.is_empty();
    if entry.is_empty() || (mode == TradingMode::Options && !all_filled) {
        return Err(InstructionError::PartialEntry {
            side: side.column_prefix(),
        });
    }

    let threshold = parse_decimal(&entry, entry_field)?;
    if threshold <= Decimal::ZERO {
        return Err(out_of_range(entry_field, threshold, "entry level > 0"));
    }

    let strike = if strike.is_empty() {
        None
    } else {
        let value = parse_decimal(&strike, strike_field)?;
        if value <= Decimal::ZERO {
            return Err(out_of_range(strike_field, value, "strike > 0"));
        }
        Some(value)
    };
    let expiration = if expiration.is_empty() {
        None
    } else {
        Some(parse_date(&expiration, exp_field)?)
    };

    Ok(Some(EntryLevel {
        threshold,
        strike,
        expiration,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn options_row() -> InstructionRow {
        InstructionRow {
            symbol: Some(" spy ".into()),
            currency: Some("USD".into()),
            trading: Some("OPTIONS".into()),
            amount: Some(Cell::Integer(1000)),
            stop: Some(Cell::Integer(10)),
            target: Some(Cell::Integer(20)),
            call_entry: Some(Cell::Integer(100)),
            call_strike: Some(Cell::Integer(101)),
            call_exp: Some("2024-03-15".into()),
            put_entry: Some(Cell::Float(95.5)),
            put_strike: Some(Cell::Integer(95)),
            put_exp: Some(Cell::Integer(20_240_315)),
            flat_delay: Some(Cell::Integer(15)),
        }
    }

    #[test]
    fn instruction_from_valid_row() {
        let instruction = Instruction::try_from(&options_row()).unwrap();

        assert_eq!(instruction.symbol.as_str(), "SPY");
        assert_eq!(instruction.mode, TradingMode::Options);
        assert_eq!(instruction.amount, dec!(1000));
        assert_eq!(instruction.stop_fraction(), dec!(0.1));
        assert_eq!(instruction.target_fraction(), dec!(0.2));
        assert_eq!(instruction.flatten_delay(), Duration::minutes(15));

        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(
            instruction.rising,
            Some(EntryLevel::option(dec!(100), dec!(101), date))
        );
        assert_eq!(
            instruction.falling,
            Some(EntryLevel::option(dec!(95.5), dec!(95), date))
        );
    }

    #[test]
    fn blank_side_is_disabled() {
        let mut row = options_row();
        row.put_entry = Some("  ".into());
        row.put_strike = None;
        row.put_exp = Some("".into());

        let instruction = Instruction::try_from(&row).unwrap();
        assert!(instruction.falling.is_none());
        assert!(instruction.level(EntrySide::Rising).is_some());
    }

    #[test]
    fn partial_side_is_rejected() {
        let mut row = options_row();
        row.call_strike = None;

        assert_eq!(
            Instruction::try_from(&row),
            Err(InstructionError::PartialEntry { side: "call" })
        );
    }

    #[test]
    fn stocks_mode_needs_only_entry_level() {
        let mut row = options_row();
        row.trading = Some("STOCKS".into());
        row.call_strike = None;
        row.call_exp = None;

        let instruction = Instruction::try_from(&row).unwrap();
        assert_eq!(instruction.rising, Some(EntryLevel::underlying(dec!(100))));
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let mut row = options_row();
        for amount in [Cell::Integer(0), Cell::Float(-5.0)] {
            row.amount = Some(amount);
            assert!(matches!(
                Instruction::try_from(&row),
                Err(InstructionError::OutOfRange { field: "amount", .. })
            ));
        }
    }

    #[test]
    fn fractional_amount_is_accepted() {
        let mut row = options_row();
        row.amount = Some(Cell::Float(0.5));
        assert_eq!(Instruction::try_from(&row).unwrap().amount, dec!(0.5));
    }

    #[test]
    fn non_positive_stop_and_target_are_rejected() {
        let mut row = options_row();
        row.stop = Some(Cell::Integer(0));
        assert!(matches!(
            Instruction::try_from(&row),
            Err(InstructionError::OutOfRange { field: "stop", .. })
        ));

        let mut row = options_row();
        row.target = Some(Cell::Integer(-5));
        assert!(matches!(
            Instruction::try_from(&row),
            Err(InstructionError::OutOfRange { field: "target", .. })
        ));
    }

    #[test]
    fn non_positive_levels_are_rejected() {
        let mut row = options_row();
        row.put_entry = Some(Cell::Integer(0));
        assert!(matches!(
            Instruction::try_from(&row),
            Err(InstructionError::OutOfRange { field: "put_entry", .. })
        ));

        let mut row = options_row();
        row.call_strike = Some(Cell::Integer(-1));
        assert!(matches!(
            Instruction::try_from(&row),
            Err(InstructionError::OutOfRange { field: "call_strike", .. })
        ));
    }

    #[test]
    fn flatten_delay_bounds() {
        let mut row = options_row();
        row.flat_delay = Some(Cell::Integer(390));
        assert_eq!(
            Instruction::try_from(&row).unwrap().flatten_delay_minutes,
            390
        );

        row.flat_delay = Some(Cell::Integer(391));
        assert!(Instruction::try_from(&row).is_err());

        row.flat_delay = Some(Cell::Integer(-1));
        assert!(Instruction::try_from(&row).is_err());

        row.flat_delay = Some(Cell::Float(2.5));
        assert!(Instruction::try_from(&row).is_err());
    }

    #[test]
    fn unknown_trading_mode_is_rejected() {
        let mut row = options_row();
        row.trading = Some("FUTURES".into());
        assert!(matches!(
            Instruction::try_from(&row),
            Err(InstructionError::OutOfRange { field: "trading", .. })
        ));
    }

    #[test]
    fn bad_expiration_is_unparseable() {
        let mut row = options_row();
        row.call_exp = Some("next friday".into());
        assert!(matches!(
            Instruction::try_from(&row),
            Err(InstructionError::Unparseable { field: "call_exp", .. })
        ));
    }

    #[test]
    fn missing_currency_is_rejected() {
        let mut row = options_row();
        row.currency = None;
        assert_eq!(
            Instruction::try_from(&row),
            Err(InstructionError::MissingField { field: "currency" })
        );
    }
}
