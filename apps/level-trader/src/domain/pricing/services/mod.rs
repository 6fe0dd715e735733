//! Tick Rule Services

mod legalizer;

pub use legalizer::legalize;
