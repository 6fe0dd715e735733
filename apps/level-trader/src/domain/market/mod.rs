//! Market Data Bounded Context
//!
//! Contracts, quotes, bars and trading hours as reported by the venue.

pub mod errors;
pub mod value_objects;

pub use errors::MarketDataError;
pub use value_objects::{
    Bar, BarRequest, BarSize, Contract, ContractKind, ContractSpec, MarketRuleRef, OptionRight,
    Quote, TradingDay, TradingHours,
};
