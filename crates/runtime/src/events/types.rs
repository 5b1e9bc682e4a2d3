//! Event payloads published by the session worker.

use serde::{Deserialize, Serialize};

use player_core::{CharacterId, Notification, Tick};

/// A notification produced by one character's command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEvent {
    pub character: CharacterId,
    pub notification: Notification,
}

/// Session lifecycle changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    LoggedIn { character: CharacterId, at: Tick },
    LoggedOut { character: CharacterId, saved: bool },
    /// Periodic or explicit flush of every live session.
    Saved { sessions: usize, failures: usize },
}
