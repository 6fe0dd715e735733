//! Instruction Bounded Context
//!
//! Per-instrument trading instructions. Raw rows from the instruction file are
//! normalized and validated here, so the state machines only ever see typed,
//! consistent records.

pub mod errors;
mod instruction_table;
pub mod value_objects;

pub use errors::InstructionError;
pub use instruction_table::{InstructionTable, RejectedRow, RejectionReason};
pub use value_objects::{Cell, EntryLevel, EntrySide, Instruction, InstructionRow, TradingMode};
