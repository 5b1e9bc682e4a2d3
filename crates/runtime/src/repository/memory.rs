//! In-memory character repository for testing and ephemeral servers.

use std::collections::BTreeMap;
use std::sync::RwLock;

use player_core::{CharacterId, CharacterSnapshot};

use super::{CharacterRepository, RepositoryError, Result};

/// Keeps snapshots in a map; nothing survives the process.
#[derive(Default)]
pub struct InMemoryCharacterRepository {
    snapshots: RwLock<BTreeMap<CharacterId, CharacterSnapshot>>,
}

impl InMemoryCharacterRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-loaded with `snapshots`.
    pub fn with_snapshots(snapshots: impl IntoIterator<Item = CharacterSnapshot>) -> Self {
        Self {
            snapshots: RwLock::new(
                snapshots
                    .into_iter()
                    .map(|snapshot| (snapshot.character.id, snapshot))
                    .collect(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().map_or(0, |map| map.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CharacterRepository for InMemoryCharacterRepository {
    fn save(&self, snapshot: &CharacterSnapshot) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots.insert(snapshot.character.id, snapshot.clone());
        Ok(())
    }

    fn load(&self, id: CharacterId) -> Result<Option<CharacterSnapshot>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(snapshots.get(&id).cloned())
    }

    fn exists(&self, id: CharacterId) -> bool {
        self.snapshots
            .read()
            .is_ok_and(|snapshots| snapshots.contains_key(&id))
    }

    fn delete(&self, id: CharacterId) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots.remove(&id);
        Ok(())
    }

    fn list(&self) -> Result<Vec<CharacterId>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(snapshots.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use player_core::{AccountId, Character};

    fn snapshot(id: u32) -> CharacterSnapshot {
        CharacterSnapshot::new(Character::new(CharacterId(id), AccountId(1), "Memo"))
    }

    #[test]
    fn saves_replace_and_list_in_order() {
        let repo = InMemoryCharacterRepository::with_snapshots([snapshot(3)]);
        repo.save(&snapshot(1)).unwrap();

        let mut updated = snapshot(3);
        updated.character.base_level = 12;
        repo.save(&updated).unwrap();

        assert_eq!(repo.list().unwrap(), vec![CharacterId(1), CharacterId(3)]);
        assert_eq!(
            repo.load(CharacterId(3)).unwrap().unwrap().character.base_level,
            12
        );

        repo.delete(CharacterId(1)).unwrap();
        assert!(!repo.exists(CharacterId(1)));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn exports_are_readable_json() {
        let repo = InMemoryCharacterRepository::with_snapshots([snapshot(5)]);
        let json = repo.export_json(CharacterId(5)).unwrap().unwrap();
        assert!(json.contains("\"Memo\""));
        assert_eq!(repo.export_json(CharacterId(6)).unwrap(), None);
    }
}
