// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Level Trader - Rust Core Library
//!
//! Automated level-crossing trading client. Watches last-trade prices of
//! configured instruments and, when a price crosses a configured level during
//! the trading session, places a bracket order (entry, stop, target and a
//! time exit) whose exits cancel each other.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Pure trading logic, no I/O and no logging
//!   - `pricing`: Tick-size legalization
//!   - `signal`: Level-crossing detection
//!   - `bracket`: Bracket composition and order references
//!   - `instrument` / `session`: Per-instrument and global state machines
//!   - `ledger`: Execution deduplication
//!
//! - **Application**: Ports and orchestration
//!   - `ports`: `VenuePort`, `MarketCalendarPort`, `InstructionSourcePort`
//!   - `services`: `TradingSession` iteration and the reconnection `Supervisor`
//!
//! - **Infrastructure**: Adapters
//!   - `venue`: Paper venue with simulated clock and order matching
//!   - `calendar`: Trading-day lookups from liquid hours
//!   - `instructions`: YAML instruction file

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Ports and services.
pub mod application;

/// Infrastructure layer - Adapters.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// Configuration loading and validation.
pub mod config;

/// Error types and their supervisor classification.
pub mod error;

/// Tracing subscriber setup.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::bracket::{BracketComposer, BracketOrder, EntrySkipped, OrderSpec};
pub use domain::instruction::{Instruction, InstructionTable, TradingMode};
pub use domain::instrument::{InstrumentRecord, TradingState};
pub use domain::ledger::ExecutionLedger;
pub use domain::pricing::{TickRule, TickRuleTable, legalize};
pub use domain::session::{GlobalState, SessionStateMachine};
pub use domain::signal::{Crossing, cross};

// Application re-exports
pub use application::ports::{InstructionSourcePort, MarketCalendarPort, VenuePort};
pub use application::services::{Supervisor, SupervisorExit, TradingSession};

// Cross-cutting re-exports
pub use config::{Config, ConfigError};
pub use error::{ErrorKind, TraderError};
