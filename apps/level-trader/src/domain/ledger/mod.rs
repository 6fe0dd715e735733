//! Execution Ledger Bounded Context
//!
//! The venue may redeliver fill and commission notifications. Everything
//! downstream reacts only to the first sighting of an execution id.

mod execution_ledger;
mod reports;

pub use execution_ledger::ExecutionLedger;
pub use reports::{CommissionReport, ExecutionId, ExecutionRecord, FillReport};
