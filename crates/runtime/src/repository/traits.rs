//! Repository contract for saving and loading characters.

use player_core::{CharacterId, CharacterSnapshot};

use super::{RepositoryError, Result};

/// Persistent store of character snapshots.
///
/// Snapshots are the only durable form of a character: everything derived
/// (bonuses, battle status, combos, timers) is rebuilt at login.
pub trait CharacterRepository: Send + Sync {
    /// Save a snapshot, replacing any previous save of the same character.
    fn save(&self, snapshot: &CharacterSnapshot) -> Result<()>;

    /// Load the latest snapshot of a character.
    fn load(&self, id: CharacterId) -> Result<Option<CharacterSnapshot>>;

    /// Check if a character has a save.
    fn exists(&self, id: CharacterId) -> bool;

    /// Delete a character's save.
    fn delete(&self, id: CharacterId) -> Result<()>;

    /// List every saved character, in ascending id order.
    fn list(&self) -> Result<Vec<CharacterId>>;

    /// Human-readable export of a saved character.
    fn export_json(&self, id: CharacterId) -> Result<Option<String>> {
        let Some(snapshot) = self.load(id)? else {
            return Ok(None);
        };
        serde_json::to_string_pretty(&snapshot)
            .map(Some)
            .map_err(|e| RepositoryError::Json(e.to_string()))
    }
}
