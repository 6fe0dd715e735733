//! YAML instruction file
//!
//! ```yaml
//! instructions:
//!   - symbol: SPY
//!     currency: USD
//!     trading: OPTIONS
//!     amount: 1000
//!     stop: 10
//!     target: 20
//!     call_entry: 101
//!     call_strike: 102
//!     call_exp: 20240315
//!     put_entry:
//!     put_strike:
//!     put_exp:
//!     flat_delay: 15
//! ```

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{InstructionSourceError, InstructionSourcePort};
use crate::domain::instruction::{InstructionRow, InstructionTable};

/// Top-level layout of the instruction file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructionDocument {
    /// One row per symbol.
    #[serde(default)]
    pub instructions: Vec<InstructionRow>,
}

/// Instruction source reading a YAML file.
#[derive(Debug, Clone)]
pub struct YamlInstructionSource {
    path: PathBuf,
}

impl YamlInstructionSource {
    /// Create a source for `path`. The file is not read until [`InstructionSourcePort::load`].
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File being read.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_error(&self, e: &std::io::Error) -> InstructionSourceError {
        InstructionSourceError::Read {
            path: self.path.display().to_string(),
            message: e.to_string(),
        }
    }
}

/// Parse an instruction document.
///
/// # Errors
///
/// Returns `Parse` if the text is not a valid instruction document.
pub fn parse_instructions(
    content: &str,
    path: &str,
) -> Result<InstructionTable, InstructionSourceError> {
    let document: InstructionDocument =
        serde_yaml_bw::from_str(content).map_err(|e| InstructionSourceError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })?;
    Ok(InstructionTable::from_rows(&document.instructions))
}

#[async_trait]
impl InstructionSourcePort for YamlInstructionSource {
    async fn modified(&self) -> Result<Option<SystemTime>, InstructionSourceError> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| self.read_error(&e))?;
        Ok(metadata.modified().ok())
    }

    async fn load(&self) -> Result<InstructionTable, InstructionSourceError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.read_error(&e))?;
        parse_instructions(&content, &self.path.display().to_string())
    }
}
