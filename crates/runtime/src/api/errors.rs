//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, repositories, and the engine so
//! clients can bubble them up with consistent context.

use thiserror::Error;
use tokio::sync::oneshot;

use player_core::{CharacterId, CommandError, ErrorSeverity, GameError};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("session worker command channel closed")]
    CommandChannelClosed,

    #[error("session worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("session worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("runtime requires content to be configured before building")]
    MissingContent,

    #[error("character {0} has no save")]
    CharacterNotFound(CharacterId),

    #[error("character {0} is already logged in")]
    AlreadyLoggedIn(CharacterId),

    #[error("character {0} is not logged in")]
    NotLoggedIn(CharacterId),

    #[error(transparent)]
    Command(#[from] CommandError),
}

impl RuntimeError {
    /// The engine's refusal, if this error is one.
    pub fn command(&self) -> Option<&CommandError> {
        match self {
            RuntimeError::Command(err) => Some(err),
            _ => None,
        }
    }
}

impl GameError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            RuntimeError::Command(err) => err.severity(),
            RuntimeError::Repository(err) => err.severity(),
            RuntimeError::CharacterNotFound(_)
            | RuntimeError::AlreadyLoggedIn(_)
            | RuntimeError::NotLoggedIn(_) => ErrorSeverity::Validation,
            _ => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RuntimeError::CommandChannelClosed => "RUNTIME_COMMAND_CHANNEL_CLOSED",
            RuntimeError::ReplyChannelClosed(_) => "RUNTIME_REPLY_CHANNEL_CLOSED",
            RuntimeError::WorkerJoin(_) => "RUNTIME_WORKER_JOIN",
            RuntimeError::Repository(err) => err.error_code(),
            RuntimeError::MissingContent => "RUNTIME_MISSING_CONTENT",
            RuntimeError::CharacterNotFound(_) => "SESSION_CHARACTER_NOT_FOUND",
            RuntimeError::AlreadyLoggedIn(_) => "SESSION_ALREADY_LOGGED_IN",
            RuntimeError::NotLoggedIn(_) => "SESSION_NOT_LOGGED_IN",
            RuntimeError::Command(err) => err.error_code(),
        }
    }
}
