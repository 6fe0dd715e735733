//! Bracket Order Services

mod bracket_composer;

pub use bracket_composer::{BracketComposer, ComposeRequest, Composition};
