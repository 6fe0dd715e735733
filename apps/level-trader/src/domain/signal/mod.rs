//! Level Crossing Bounded Context
//!
//! Edge-triggered detection of a last-trade price moving through a
//! configured level between two consecutive samples.

mod crossing;
mod price_sample;

pub use crossing::{Crossing, cross};
pub use price_sample::PriceSample;
