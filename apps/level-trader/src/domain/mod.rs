//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Aggregates**: Consistency boundaries with invariants
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Domain Services**: Stateless business logic
//!
//! Nothing here logs. State machines return the transitions they performed and
//! the application layer records them.
//!
//! # Bounded Contexts
//!
//! - [`pricing`]: Tick-size legalization
//! - [`signal`]: Level-crossing detection
//! - [`instruction`]: Validated per-symbol trading instructions
//! - [`market`]: Contracts, quotes, bars and trading hours
//! - [`bracket`]: Bracket order composition with one-cancels-all exits
//! - [`instrument`]: Per-instrument trading state machine
//! - [`session`]: Global session state machine
//! - [`ledger`]: Execution deduplication

pub mod bracket;
pub mod instruction;
pub mod instrument;
pub mod ledger;
pub mod market;
pub mod pricing;
pub mod session;
pub mod shared;
pub mod signal;
