//! Bracket Order Bounded Context
//!
//! Turns an entry signal into four linked orders: a market entry, and three
//! exits (protective stop, profit target, time-based flatten) joined in a
//! one-cancels-all group so at most one of them closes the position.

pub mod services;
pub mod value_objects;

pub use services::{BracketComposer, ComposeRequest, Composition};
pub use value_objects::{
    BracketOrder, EntrySkipped, LegRole, OcaGroup, OcaKind, OrderHandle, OrderKind, OrderSide,
    OrderSpec, PlacedBracket, PositionDirection,
};
