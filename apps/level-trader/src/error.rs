//! Trader errors and their classification.
//!
//! Every failure that can end a trading iteration rolls up into
//! [`TraderError`]. The supervisor is the only place that reads
//! [`TraderError::kind`] to decide between retrying, escalating and stopping.
//!
//! | Kind | Variants | Supervisor reaction |
//! |------|----------|---------------------|
//! | `FATAL` | `AccountNotManaged`, `RetryBudgetExhausted`, `Config` | Disconnect and exit |
//! | `SHUTDOWN` | `Interrupted` | Disconnect and exit cleanly |
//! | `RECOVERABLE` | everything else | Tear down, pause, reconnect |

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ports::{CalendarError, InstructionSourceError, VenueError};
use crate::config::ConfigError;
use crate::domain::pricing::TickRuleError;
use crate::domain::shared::TransitionError;

/// How the supervisor treats an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Terminate the process.
    Fatal,
    /// Tear down the connection and try again.
    Recoverable,
    /// Stop on request.
    Shutdown,
}

impl ErrorKind {
    /// Stable reason string for logs.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Fatal => "FATAL",
            Self::Recoverable => "RECOVERABLE",
            Self::Shutdown => "SHUTDOWN",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Errors raised by a trading iteration or by the supervisor itself.
#[derive(Debug, Error)]
pub enum TraderError {
    /// The configured account is not among the venue's managed accounts.
    #[error("Account {account} is not managed by this connection (managed: {managed:?})")]
    AccountNotManaged {
        /// Configured account.
        account: String,
        /// Accounts reported by the venue.
        managed: Vec<String>,
    },

    /// Too many recoverable failures, or fail-fast is enabled.
    #[error("Giving up after {failures} recoverable failures: {last}")]
    RetryBudgetExhausted {
        /// Failures seen so far.
        failures: u32,
        /// Message of the failure that exhausted the budget.
        last: String,
    },

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Shutdown was requested.
    #[error("Interrupted by shutdown request")]
    Interrupted,

    /// A venue request failed.
    #[error(transparent)]
    Venue(#[from] VenueError),

    /// The market calendar could not answer.
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// The instruction source could not be read.
    #[error(transparent)]
    InstructionSource(#[from] InstructionSourceError),

    /// The entry leg did not fill in time.
    #[error("Entry {order_ref} for {symbol} filled {filled} of {size} before timing out")]
    EntryFillTimeout {
        /// Underlying symbol.
        symbol: String,
        /// Entry order reference.
        order_ref: String,
        /// Quantity filled.
        filled: Decimal,
        /// Quantity ordered.
        size: Decimal,
    },

    /// A stop or target could not be legalized.
    #[error(transparent)]
    TickRule(#[from] TickRuleError),

    /// A state machine refused a transition.
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl TraderError {
    /// Classification used by the supervisor.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountNotManaged { .. } | Self::RetryBudgetExhausted { .. } | Self::Config(_) => {
                ErrorKind::Fatal
            }
            Self::Interrupted => ErrorKind::Shutdown,
            Self::Venue(_)
            | Self::Calendar(_)
            | Self::InstructionSource(_)
            | Self::EntryFillTimeout { .. }
            | Self::TickRule(_)
            | Self::Transition(_) => ErrorKind::Recoverable,
        }
    }
}
