//! Instrument Bounded Context
//!
//! Per-symbol trading state, price sampling and the bracket currently working.

mod instrument_record;
mod trading_state;

pub use instrument_record::{InstructionUpdate, InstrumentRecord};
pub use trading_state::TradingState;
