//! File-based CharacterRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use player_core::{CharacterId, CharacterSnapshot};
use tracing::{debug, warn};

use crate::repository::{CharacterRepository, RepositoryError, Result};
use crate::utils::{DIGEST_LEN, short_hex, snapshot_digest};

/// File-based implementation of CharacterRepository.
///
/// Each character is stored as `character_{id}.bin`.
///
/// # File Format
///
/// ```text
/// [32 bytes SHA-256 of payload][bincode payload]
/// ```
///
/// The digest is checked on load so a torn or tampered save is reported as
/// [`RepositoryError::CorruptedData`] instead of producing a wrong character.
/// Writes go to a temporary file first and are renamed into place.
pub struct FileCharacterRepository {
    base_dir: PathBuf,
}

impl FileCharacterRepository {
    /// Create a new file-based repository rooted at `base_dir`.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn character_path(&self, id: CharacterId) -> PathBuf {
        self.base_dir.join(format!("character_{}.bin", id.0))
    }

    fn decode(id: CharacterId, bytes: &[u8]) -> Result<CharacterSnapshot> {
        if bytes.len() < DIGEST_LEN {
            return Err(RepositoryError::CorruptedData {
                character: id,
                reason: format!("file is only {} bytes", bytes.len()),
            });
        }
        let (stored, payload) = bytes.split_at(DIGEST_LEN);
        let digest = snapshot_digest(payload);
        if stored != digest {
            return Err(RepositoryError::CorruptedData {
                character: id,
                reason: "digest mismatch".into(),
            });
        }

        let snapshot: CharacterSnapshot = bincode::deserialize(payload)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        if snapshot.character.id != id {
            return Err(RepositoryError::CorruptedData {
                character: id,
                reason: format!("file holds character {}", snapshot.character.id),
            });
        }
        Ok(snapshot)
    }
}

impl CharacterRepository for FileCharacterRepository {
    fn save(&self, snapshot: &CharacterSnapshot) -> Result<()> {
        let id = snapshot.character.id;
        let path = self.character_path(id);
        let temp_path = path.with_extension("bin.tmp");

        let payload = bincode::serialize(snapshot)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        let digest = snapshot_digest(&payload);

        let mut bytes = Vec::with_capacity(DIGEST_LEN + payload.len());
        bytes.extend_from_slice(&digest);
        bytes.extend_from_slice(&payload);

        fs::write(&temp_path, bytes).map_err(RepositoryError::Io)?;
        fs::rename(&temp_path, &path).map_err(RepositoryError::Io)?;

        debug!(
            character = %id,
            digest = %short_hex(&digest),
            "saved character to {}",
            path.display()
        );
        Ok(())
    }

    fn load(&self, id: CharacterId) -> Result<Option<CharacterSnapshot>> {
        let path = self.character_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path).map_err(RepositoryError::Io)?;
        let snapshot = Self::decode(id, &bytes).inspect_err(|err| {
            warn!(character = %id, %err, "rejected save file {}", path.display());
        })?;

        debug!(character = %id, "loaded character from {}", path.display());
        Ok(Some(snapshot))
    }

    fn exists(&self, id: CharacterId) -> bool {
        self.character_path(id).exists()
    }

    fn delete(&self, id: CharacterId) -> Result<()> {
        let path = self.character_path(id);
        if path.exists() {
            fs::remove_file(&path).map_err(RepositoryError::Io)?;
            debug!(character = %id, "deleted character save");
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<CharacterId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.base_dir).map_err(RepositoryError::Io)? {
            let path = entry.map_err(RepositoryError::Io)?.path();
            if let Some(filename) = path.file_name().and_then(|s| s.to_str())
                && let Some(id) = filename
                    .strip_prefix("character_")
                    .and_then(|s| s.strip_suffix(".bin"))
                && let Ok(id) = id.parse::<u32>()
            {
                ids.push(CharacterId(id));
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use player_core::{AccountId, Character, InventoryItem, ItemId};

    fn snapshot(id: u32) -> CharacterSnapshot {
        let mut character = Character::new(CharacterId(id), AccountId(9), "Filed");
        character.base_level = 42;
        let mut snapshot = CharacterSnapshot::new(character);
        snapshot
            .inventory
            .add(InventoryItem::new(ItemId(501), 3))
            .unwrap();
        snapshot
    }

    #[test]
    fn saves_survive_a_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileCharacterRepository::new(dir.path())
            .unwrap()
            .save(&snapshot(4))
            .unwrap();

        let reopened = FileCharacterRepository::new(dir.path()).unwrap();
        assert_eq!(reopened.load(CharacterId(4)).unwrap(), Some(snapshot(4)));
        assert_eq!(reopened.list().unwrap(), vec![CharacterId(4)]);
        assert!(!dir.path().join("character_4.bin.tmp").exists());
    }

    #[test]
    fn flipped_bytes_are_reported_as_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileCharacterRepository::new(dir.path()).unwrap();
        repo.save(&snapshot(8)).unwrap();

        let path = dir.path().join("character_8.bin");
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            repo.load(CharacterId(8)),
            Err(RepositoryError::CorruptedData { .. })
        ));
    }

    #[test]
    fn missing_characters_load_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileCharacterRepository::new(dir.path()).unwrap();
        assert_eq!(repo.load(CharacterId(1)).unwrap(), None);
        repo.delete(CharacterId(1)).unwrap();
    }
}
