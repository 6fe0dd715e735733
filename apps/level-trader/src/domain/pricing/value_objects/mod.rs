//! Tick Rule Value Objects

mod tick_rule;

pub use tick_rule::{TickRule, TickRuleTable};
