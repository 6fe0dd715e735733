//! Market Data Value Objects

mod bar;
mod contract;
mod quote;
mod trading_hours;

pub use bar::{Bar, BarRequest, BarSize};
pub use contract::{Contract, ContractKind, ContractSpec, MarketRuleRef, OptionRight};
pub use quote::Quote;
pub use trading_hours::{TradingDay, TradingHours};
