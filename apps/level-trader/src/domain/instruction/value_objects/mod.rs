//! Instruction Value Objects

mod cell;
mod entry_level;
mod instruction;
mod trading_mode;

pub use cell::Cell;
pub use entry_level::{EntryLevel, EntrySide};
pub use instruction::{Instruction, InstructionRow};
pub use trading_mode::TradingMode;
