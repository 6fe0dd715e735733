//! Instruction Source Port (Driven Port)
//!
//! Where per-symbol trading instructions come from.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::instruction::{InstructionRow, InstructionTable};

/// Instruction source errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstructionSourceError {
    /// The source could not be read.
    #[error("Failed to read instructions from {path}: {message}")]
    Read {
        /// Source location.
        path: String,
        /// Error details.
        message: String,
    },

    /// The source was read but is not a valid instruction document.
    #[error("Failed to parse instructions from {path}: {message}")]
    Parse {
        /// Source location.
        path: String,
        /// Error details.
        message: String,
    },
}

/// Port for loading instructions.
#[async_trait]
pub trait InstructionSourcePort: Send + Sync {
    /// Modification stamp. A change means the instructions must be reloaded.
    async fn modified(&self) -> Result<Option<SystemTime>, InstructionSourceError>;

    /// Load and validate every row.
    async fn load(&self) -> Result<InstructionTable, InstructionSourceError>;
}

/// In-memory instruction source for tests and scripted runs.
#[derive(Debug)]
pub struct InMemoryInstructionSource {
    state: RwLock<(Vec<InstructionRow>, SystemTime)>,
}

impl InMemoryInstructionSource {
    /// Create a source serving `rows`.
    #[must_use]
    pub fn new(rows: Vec<InstructionRow>) -> Self {
        Self {
            state: RwLock::new((rows, SystemTime::UNIX_EPOCH)),
        }
    }

    /// Replace the rows and bump the modification stamp.
    pub fn replace(&self, rows: Vec<InstructionRow>) {
        let mut state = self.state.write();
        let stamp = state.1 + Duration::from_secs(1);
        *state = (rows, stamp);
    }
}

#[async_trait]
impl InstructionSourcePort for InMemoryInstructionSource {
    async fn modified(&self) -> Result<Option<SystemTime>, InstructionSourceError> {
        Ok(Some(self.state.read().1))
    }

    async fn load(&self) -> Result<InstructionTable, InstructionSourceError> {
        Ok(InstructionTable::from_rows(&self.state.read().0))
    }
}
