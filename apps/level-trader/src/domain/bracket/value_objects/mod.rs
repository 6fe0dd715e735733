//! Bracket Order Value Objects

mod bracket_order;
mod entry_skipped;
mod order_spec;
mod placed_bracket;

pub use bracket_order::{BracketOrder, PositionDirection};
pub use entry_skipped::EntrySkipped;
pub use order_spec::{LegRole, OcaGroup, OcaKind, OrderKind, OrderSide, OrderSpec};
pub use placed_bracket::{OrderHandle, PlacedBracket};
