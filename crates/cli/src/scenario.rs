//! Scripted sessions.
//!
//! A scenario seeds characters into the repository and lists the steps to
//! replay against the runtime, in order.

use std::path::Path;

use anyhow::{Context, Result};
use ron::extensions::Extensions;
use serde::Deserialize;

use player_core::state::Sex;
use player_core::{
    AccountId, Character, CharacterId, CharacterSnapshot, InventoryItem, JobId, PlayerCommand,
    Tick, TimerId,
};

#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub characters: Vec<CharacterSeed>,
    pub steps: Vec<Step>,
}

/// A character written to the repository before the replay starts.
#[derive(Debug, Deserialize)]
pub struct CharacterSeed {
    pub id: CharacterId,
    pub account: AccountId,
    pub name: String,
    #[serde(default)]
    pub sex: Sex,
    pub job: JobId,
    pub base_level: u16,
    pub job_level: u16,
    #[serde(default)]
    pub status_points: u32,
    #[serde(default)]
    pub skill_points: u32,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
}

impl CharacterSeed {
    pub fn snapshot(&self) -> CharacterSnapshot {
        let mut character = Character::new(self.id, self.account, self.name.clone());
        character.sex = self.sex;
        character.job = self.job;
        character.base_level = self.base_level;
        character.job_level = self.job_level;
        character.status_points = self.status_points;
        character.skill_points = self.skill_points;

        let mut snapshot = CharacterSnapshot::new(character);
        for item in &self.inventory {
            if snapshot.inventory.add(*item).is_none() {
                tracing::warn!(character = %self.id, item = %item.item, "seed inventory full");
            }
        }
        snapshot
    }
}

#[derive(Debug, Deserialize)]
pub enum Step {
    Login(CharacterId),
    Logout(CharacterId),
    Execute {
        character: CharacterId,
        command: PlayerCommand,
    },
    Advance(Tick),
    FireTimer {
        character: CharacterId,
        timer: TimerId,
    },
    /// Log a summary of a live character.
    Show(CharacterId),
    SaveAll,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let options = ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .with_default_extension(Extensions::UNWRAP_NEWTYPES);
        Ok(options.from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_demo_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/knight.ron");
        let scenario = Scenario::load(&path).unwrap();
        assert!(!scenario.characters.is_empty());
        assert!(matches!(scenario.steps.first(), Some(Step::Login(_))));
    }

    #[test]
    fn seeds_fill_the_inventory() {
        let scenario = Scenario::parse(
            r#"(
                characters: [(
                    id: 1, account: 1, name: "Seed", job: 0,
                    base_level: 5, job_level: 3,
                    inventory: [(item: 501, amount: 10)],
                )],
                steps: [Login(1), SaveAll],
            )"#,
        )
        .unwrap();
        let snapshot = scenario.characters[0].snapshot();
        assert_eq!(snapshot.character.base_level, 5);
        assert_eq!(snapshot.inventory.iter().count(), 1);
    }
}
