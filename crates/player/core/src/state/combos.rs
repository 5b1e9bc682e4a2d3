use arrayvec::ArrayVec;

use super::common::{ComboId, ScriptId};
use super::equipment::EquipPoints;
use crate::config::EngineConfig;

/// A combo whose members are all equipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveCombo {
    pub id: ComboId,
    pub script: ScriptId,
    /// Slots whose occupants satisfy the combo's members.
    pub slots: EquipPoints,
}

/// Active combos, at most one entry per combo id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComboSet {
    entries: ArrayVec<ActiveCombo, { EngineConfig::MAX_COMBOS }>,
}

impl ComboSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: ComboId) -> bool {
        self.entries.iter().any(|c| c.id == id)
    }

    /// Adds `combo`; `Err` returns it when the set is full.
    pub fn insert(&mut self, combo: ActiveCombo) -> Result<(), ActiveCombo> {
        if self.contains(combo.id) {
            return Ok(());
        }
        self.entries.try_push(combo).map_err(|err| err.element())
    }

    /// Removes every combo that uses any of `points`, returning them.
    pub fn retract_touching(&mut self, points: EquipPoints) -> Vec<ActiveCombo> {
        let mut removed = Vec::new();
        self.entries.retain(|combo| {
            if combo.slots.intersects(points) {
                removed.push(*combo);
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveCombo> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
