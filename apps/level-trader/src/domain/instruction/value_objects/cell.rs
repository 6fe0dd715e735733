//! Spreadsheet-like cell values.

use serde::{Deserialize, Serialize};

/// One cell of an instruction row.
///
/// Instruction files are edited by hand, so a cell may hold a bare number,
/// a quoted string, or a boolean. Everything is read back as trimmed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Whole number.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Free text.
    Text(String),
}

impl Cell {
    /// The cell's contents as whitespace-trimmed text.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Integer(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Bool(v) => v.to_string(),
            Self::Text(v) => v.trim().to_string(),
        }
    }

    /// Trimmed text of an optional cell, empty for a missing cell.
    #[must_use]
    pub fn text_of(cell: Option<&Self>) -> String {
        cell.map(Self::text).unwrap_or_default()
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}
