//! Instruction Validation Errors

use thiserror::Error;

/// Reasons an instruction row is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InstructionError {
    /// A required cell is blank.
    #[error("{field} is required")]
    MissingField {
        /// Column name.
        field: &'static str,
    },

    /// A cell could not be parsed.
    #[error("{field} has unparseable value '{value}'")]
    Unparseable {
        /// Column name.
        field: &'static str,
        /// Raw cell text.
        value: String,
    },

    /// A parsed value violates its range rule.
    #[error("{field} = {value} violates rule: {rule}")]
    OutOfRange {
        /// Column name.
        field: &'static str,
        /// Parsed value as text.
        value: String,
        /// The rule that was violated.
        rule: &'static str,
    },

    /// Only some of an entry side's cells are filled.
    #[error("{side} entry must have entry, strike and expiration all filled or all blank")]
    PartialEntry {
        /// Side prefix ("call" or "put").
        side: &'static str,
    },

    /// The symbol itself is malformed.
    #[error("invalid symbol: {message}")]
    InvalidSymbol {
        /// Validation message.
        message: String,
    },
}
