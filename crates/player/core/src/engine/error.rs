//! Error type returned by engine commands.

use crate::env::OracleError;
use crate::error::{DenyReason, ErrorSeverity, GameError};

/// Why a command did not complete. The character is left exactly as it was
/// before the command, apart from repairs recorded in its diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandError {
    #[error("denied: {0}")]
    Denied(#[from] DenyReason),

    #[error("reference data: {0}")]
    Oracle(#[from] OracleError),
}

impl CommandError {
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            CommandError::Denied(reason) => Some(*reason),
            CommandError::Oracle(_) => None,
        }
    }
}

impl GameError for CommandError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            CommandError::Denied(reason) => reason.severity(),
            CommandError::Oracle(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            CommandError::Denied(reason) => reason.error_code(),
            CommandError::Oracle(err) => err.error_code(),
        }
    }
}
