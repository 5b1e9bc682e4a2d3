//! Per-character state owned by a connected session.
//!
//! [`PlayerState`] is the aggregate the engine mutates. Persistent parts
//! (character, inventory, loadout, skill record, statuses, cooldowns) round
//! trip through [`CharacterSnapshot`]; everything else is rebuilt by the
//! recompute pass or rescheduled on login.
mod character;
mod combos;
mod common;
mod effects;
mod equipment;
mod inventory;
mod skills;
mod snapshot;
mod status;
mod timers;

pub use character::{Character, Sex, StateFlags};
pub use combos::{ActiveCombo, ComboSet};
pub use common::{
    AccountId, CharacterId, ComboId, InventoryIndex, ItemId, JobId, ScriptId, SkillId, Tick,
    TimerId, ZoneId,
};
pub use effects::{ActiveAutobonus, AutobonusSet, Cooldown, CooldownSet};
pub use equipment::{AMBIGUOUS_PAIRS, EquipPoints, EquipSlot, EquipSlots, Loadout};
pub use inventory::{Inventory, InventoryItem};
pub use skills::{SkillLevel, SkillRecord, TemporarySource};
pub use snapshot::{CharacterSnapshot, PersistedCooldown, PersistedStatus, SNAPSHOT_VERSION};
pub use status::{ActiveStatus, StatusKind, StatusSet};
pub use timers::{Timer, TimerKind, TimerRegistry};

use crate::stats::{BattleStatus, BonusTable};

/// Counters for conditions that are recovered in place instead of failing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostics {
    /// Entries dropped because a bounded table was full.
    pub capacity_drops: u32,
    /// Inconsistent slots or records reset to a safe default.
    pub repairs: u32,
    /// Bonus calls ignored for an invalid discriminant.
    pub rejected_bonuses: u32,
}

/// Last application tick of natural and equipment-driven regeneration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegenClock {
    pub natural: Tick,
    /// Indexed by `PeriodicKind` order: HP regen, SP regen, HP loss, SP loss.
    pub periodic: [Tick; 4],
}

/// Everything the engine knows about one connected character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerState {
    pub character: Character,
    pub inventory: Inventory,
    pub loadout: Loadout,
    pub skills: SkillRecord,
    pub statuses: StatusSet,
    pub combos: ComboSet,
    pub autobonuses: AutobonusSet,
    pub cooldowns: CooldownSet,
    pub timers: TimerRegistry,
    /// Bonus table produced by the last recompute pass.
    pub bonuses: BonusTable,
    pub battle: BattleStatus,
    /// Total carried weight.
    pub weight: u32,
    /// Last tick the engine observed.
    pub clock: Tick,
    pub regen: RegenClock,
    pub diagnostics: Diagnostics,
}

impl PlayerState {
    /// Fresh state around `character` with empty collections. Derived values
    /// are zero until the first recompute.
    pub fn new(character: Character) -> Self {
        Self {
            character,
            inventory: Inventory::new(),
            loadout: Loadout::default(),
            skills: SkillRecord::new(),
            statuses: StatusSet::new(),
            combos: ComboSet::new(),
            autobonuses: AutobonusSet::new(),
            cooldowns: CooldownSet::new(),
            timers: TimerRegistry::new(),
            bonuses: BonusTable::new(),
            battle: BattleStatus::default(),
            weight: 0,
            clock: Tick::ZERO,
            regen: RegenClock::default(),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn id(&self) -> CharacterId {
        self.character.id
    }

    /// Inventory index in `slot` of the live set.
    pub fn equipped(&self, slot: EquipSlot) -> Option<InventoryIndex> {
        self.loadout.live.get(slot)
    }

    /// Whether `index` is held anywhere in the live set.
    pub fn is_equipped(&self, index: InventoryIndex) -> bool {
        !self.loadout.live.points_of(index).is_empty()
    }

    /// Drops every pending timer; used when the session goes away.
    pub fn cancel_all_timers(&mut self) -> usize {
        let count = self.timers.len();
        self.timers.clear();
        count
    }
}
