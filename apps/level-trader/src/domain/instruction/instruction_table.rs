//! Instruction table built from raw rows.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use super::{Instruction, InstructionError, InstructionRow};
use crate::domain::shared::Symbol;

/// Why a row did not make it into the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// Another row already defines the symbol.
    Duplicate,
    /// The row failed validation.
    Invalid(InstructionError),
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate => write!(f, "duplicate symbol, row dropped"),
            Self::Invalid(e) => write!(f, "{e}"),
        }
    }
}

/// A row excluded from the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// Zero-based row position in the source.
    pub index: usize,
    /// Symbol text as written in the row.
    pub symbol: String,
    /// Rejection reason.
    pub reason: RejectionReason,
}

/// Validated instructions keyed by symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionTable {
    instructions: BTreeMap<Symbol, Instruction>,
    rejected: Vec<RejectedRow>,
}

impl InstructionTable {
    /// Build a table from raw rows.
    ///
    /// The first row of each symbol wins; later rows with the same symbol are
    /// dropped. Rows failing validation are dropped. Every dropped row is kept
    /// in [`Self::rejected`] so the caller can report it.
    #[must_use]
    pub fn from_rows(rows: &[InstructionRow]) -> Self {
        let mut table = Self::default();
        let mut seen: HashSet<Symbol> = HashSet::new();

        for (index, row) in rows.iter().enumerate() {
            let text = row.symbol_text();
            if !seen.insert(Symbol::new(text.as_str())) {
                table.rejected.push(RejectedRow {
                    index,
                    symbol: text,
                    reason: RejectionReason::Duplicate,
                });
                continue;
            }
            match Instruction::try_from(row) {
                Ok(instruction) => {
                    table
                        .instructions
                        .insert(instruction.symbol.clone(), instruction);
                }
                Err(e) => table.rejected.push(RejectedRow {
                    index,
                    symbol: text,
                    reason: RejectionReason::Invalid(e),
                }),
            }
        }

        table
    }

    /// Instruction for a symbol.
    #[must_use]
    pub fn get(&self, symbol: &Symbol) -> Option<&Instruction> {
        self.instructions.get(symbol)
    }

    /// Whether the table has an instruction for `symbol`.
    #[must_use]
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.instructions.contains_key(symbol)
    }

    /// Instructions in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.values()
    }

    /// Rows that were dropped while building the table.
    #[must_use]
    pub fn rejected(&self) -> &[RejectedRow] {
        &self.rejected
    }

    /// Number of valid instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the table has no valid instruction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instruction::Cell;
    use rust_decimal_macros::dec;

    fn row(symbol: &str, amount: i64) -> InstructionRow {
        InstructionRow {
            symbol: Some(symbol.into()),
            currency: Some("USD".into()),
            trading: Some("OPTIONS".into()),
            amount: Some(Cell::Integer(amount)),
            stop: Some(Cell::Integer(10)),
            target: Some(Cell::Integer(20)),
            call_entry: Some(Cell::Integer(100)),
            call_strike: Some(Cell::Integer(100)),
            call_exp: Some("2024-03-15".into()),
            flat_delay: Some(Cell::Integer(0)),
            ..InstructionRow::default()
        }
    }

    #[test]
    fn duplicates_keep_first_row() {
        let table = InstructionTable::from_rows(&[row("SPY", 1000), row(" spy", 5000)]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&Symbol::new("SPY")).unwrap().amount, dec!(1000));
        assert_eq!(table.rejected().len(), 1);
        assert_eq!(table.rejected()[0].index, 1);
        assert_eq!(table.rejected()[0].reason, RejectionReason::Duplicate);
    }

    #[test]
    fn invalid_rows_are_dropped() {
        let table = InstructionTable::from_rows(&[row("SPY", 0), row("QQQ", 1000)]);

        assert_eq!(table.len(), 1);
        assert!(table.contains(&Symbol::new("QQQ")));
        assert!(!table.contains(&Symbol::new("SPY")));
        assert!(matches!(
            table.rejected()[0].reason,
            RejectionReason::Invalid(InstructionError::OutOfRange { field: "amount", .. })
        ));
    }

    #[test]
    fn iteration_is_symbol_ordered() {
        let table = InstructionTable::from_rows(&[row("SPY", 1000), row("AAPL", 1000)]);
        let symbols: Vec<&str> = table.iter().map(|i| i.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "SPY"]);
    }

    #[test]
    fn rejection_display() {
        assert_eq!(
            RejectionReason::Duplicate.to_string(),
            "duplicate symbol, row dropped"
        );
        let reason = RejectionReason::Invalid(InstructionError::MissingField { field: "stop" });
        assert_eq!(reason.to_string(), "stop is required");
    }
}
