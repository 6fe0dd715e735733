//! Domain errors shared by the bounded contexts.

use thiserror::Error;

/// Domain-level errors that can occur in business logic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Invalid value for a field.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },
}

/// A state machine was asked to perform a transition its current state forbids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity} cannot transition from {from} to {to}")]
pub struct TransitionError {
    /// Entity whose state was being changed (symbol or "global").
    pub entity: String,
    /// Current state.
    pub from: String,
    /// Requested state.
    pub to: String,
}

impl TransitionError {
    /// Create a new transition error.
    #[must_use]
    pub fn new(entity: impl Into<String>, from: impl ToString, to: impl ToString) -> Self {
        Self {
            entity: entity.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::InvalidValue {
            field: "symbol".to_string(),
            message: "Symbol cannot be empty".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for symbol: Symbol cannot be empty"
        );

        let err = TransitionError::new("SPY", "ACTIVE", "DONE_NO_VALID_DERIVATIVE");
        assert_eq!(
            err.to_string(),
            "SPY cannot transition from ACTIVE to DONE_NO_VALID_DERIVATIVE"
        );
    }
}
