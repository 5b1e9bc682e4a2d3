//! Persistence snapshot.
//!
//! Holds what is needed to rebuild identical derived state after reload:
//! the character record, inventory, both loadouts, the persisted part of the
//! skill record and the remaining duration of statuses and cooldowns.

use super::character::Character;
use super::common::{SkillId, Tick};
use super::equipment::Loadout;
use super::inventory::Inventory;
use super::skills::{SkillLevel, SkillRecord};
use super::status::{ActiveStatus, StatusKind};
use super::timers::TimerKind;
use super::{Cooldown, PlayerState};

/// Bumped whenever the snapshot layout changes.
pub const SNAPSHOT_VERSION: u16 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PersistedStatus {
    pub kind: StatusKind,
    pub value: i32,
    /// Milliseconds left when saved.
    pub remaining: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PersistedCooldown {
    pub skill: SkillId,
    pub remaining: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterSnapshot {
    pub version: u16,
    pub character: Character,
    pub inventory: Inventory,
    pub loadout: Loadout,
    pub skills: Vec<(SkillId, SkillLevel)>,
    pub statuses: Vec<PersistedStatus>,
    pub cooldowns: Vec<PersistedCooldown>,
}

impl CharacterSnapshot {
    /// A brand-new character with nothing equipped or learned.
    pub fn new(character: Character) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            character,
            inventory: Inventory::new(),
            loadout: Loadout::default(),
            skills: Vec::new(),
            statuses: Vec::new(),
            cooldowns: Vec::new(),
        }
    }
}

impl PlayerState {
    /// Captures the persistent part of the state at `self.clock`.
    ///
    /// Temporary skill levels are dropped and overridden levels are saved at
    /// their original value.
    pub fn to_snapshot(&self) -> CharacterSnapshot {
        let now = self.clock;
        CharacterSnapshot {
            version: SNAPSHOT_VERSION,
            character: self.character.clone(),
            inventory: self.inventory.clone(),
            loadout: self.loadout,
            skills: self
                .skills
                .iter()
                .filter_map(|(id, level)| level.persisted().map(|l| (id, l)))
                .collect(),
            statuses: self
                .statuses
                .iter()
                .filter(|s| s.expires_at > now)
                .map(|s| PersistedStatus {
                    kind: s.kind,
                    value: s.value,
                    remaining: now.until(s.expires_at),
                })
                .collect(),
            cooldowns: self
                .cooldowns
                .iter()
                .filter(|c| c.until > now)
                .map(|c| PersistedCooldown {
                    skill: c.skill,
                    remaining: now.until(c.until),
                })
                .collect(),
        }
    }

    /// Rebuilds the raw state from a snapshot at `now`, rescheduling status,
    /// cooldown and rental timers. Derived values stay empty until the engine
    /// resolves the skill tree and recomputes.
    pub fn from_snapshot(snapshot: CharacterSnapshot, now: Tick) -> Self {
        let mut state = PlayerState::new(snapshot.character);
        state.inventory = snapshot.inventory;
        state.loadout = snapshot.loadout;
        state.clock = now;
        state.regen.natural = now;
        state.regen.periodic = [now; 4];

        let mut skills = SkillRecord::new();
        for (id, level) in snapshot.skills {
            if let Some(level) = level.persisted() {
                skills.set(id, level);
            }
        }
        state.skills = skills;

        for status in snapshot.statuses {
            let expires_at = now + status.remaining;
            let timer = state
                .timers
                .schedule(expires_at, TimerKind::StatusExpiry(status.kind));
            let active = ActiveStatus {
                kind: status.kind,
                value: status.value,
                expires_at,
                timer,
            };
            if state.statuses.upsert(active).is_err() {
                state.timers.cancel(timer);
                state.diagnostics.capacity_drops += 1;
            }
        }

        for cooldown in snapshot.cooldowns {
            let until = now + cooldown.remaining;
            let timer = state
                .timers
                .schedule(until, TimerKind::SkillCooldown(cooldown.skill));
            let entry = Cooldown {
                skill: cooldown.skill,
                until,
                timer,
            };
            if state.cooldowns.upsert(entry).is_err() {
                state.timers.cancel(timer);
                state.diagnostics.capacity_drops += 1;
            }
        }

        let rentals: Vec<_> = state
            .inventory
            .iter()
            .filter_map(|(index, item)| item.expires_at.map(|at| (index, at)))
            .collect();
        for (index, expires_at) in rentals {
            state
                .timers
                .schedule(expires_at.max(now), TimerKind::RentalExpiry(index));
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AccountId, CharacterId, InventoryItem, ItemId, TemporarySource};

    fn sample() -> PlayerState {
        let character = Character::new(CharacterId(7), AccountId(1), "Tester");
        let mut state = PlayerState::new(character);
        state.clock = Tick(1_000);
        state.skills.set(SkillId(1), SkillLevel::Permanent(3));
        state
            .skills
            .apply_temporary(SkillId(1), 9, TemporarySource::Item);
        state
            .skills
            .apply_temporary(SkillId(2), 1, TemporarySource::RankTrack);
        state.skills.set(SkillId(3), SkillLevel::Plagiarized(4));
        state
    }

    #[test]
    fn snapshot_keeps_only_persistent_levels() {
        let snapshot = sample().to_snapshot();
        assert_eq!(
            snapshot.skills,
            vec![
                (SkillId(1), SkillLevel::Permanent(3)),
                (SkillId(3), SkillLevel::Plagiarized(4)),
            ]
        );
    }

    #[test]
    fn remaining_durations_are_rescheduled_on_load() {
        let mut state = sample();
        let timer = state
            .timers
            .schedule(Tick(4_000), TimerKind::SkillCooldown(SkillId(5)));
        state
            .cooldowns
            .upsert(Cooldown {
                skill: SkillId(5),
                until: Tick(4_000),
                timer,
            })
            .unwrap();
        let rental = state
            .inventory
            .add(InventoryItem::new(ItemId(1201), 1).with_expiry(Tick(50_000)))
            .unwrap();

        let snapshot = state.to_snapshot();
        assert_eq!(snapshot.cooldowns[0].remaining, 3_000);

        let restored = PlayerState::from_snapshot(snapshot, Tick(10_000));
        assert_eq!(restored.cooldowns.get(SkillId(5)).map(|c| c.until), Some(Tick(13_000)));
        assert_eq!(restored.timers.len(), 2);
        assert!(
            restored
                .timers
                .due(Tick(50_000))
                .iter()
                .any(|id| restored.timers.get(*id).map(|t| t.kind)
                    == Some(TimerKind::RentalExpiry(rental)))
        );
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let snapshot = sample().to_snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: CharacterSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
