//! Error types raised by repository implementations.

use thiserror::Error;

use player_core::{CharacterId, ErrorSeverity, GameError};

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("character repository lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("corrupted save for character {character}: {reason}")]
    CorruptedData {
        character: CharacterId,
        reason: String,
    },
}

impl GameError for RepositoryError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            RepositoryError::CorruptedData { .. } => ErrorSeverity::Fatal,
            _ => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RepositoryError::LockPoisoned => "REPO_LOCK_POISONED",
            RepositoryError::Io(_) => "REPO_IO",
            RepositoryError::Serialization(_) => "REPO_SERIALIZATION",
            RepositoryError::Json(_) => "REPO_JSON",
            RepositoryError::CorruptedData { .. } => "REPO_CORRUPTED",
        }
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
