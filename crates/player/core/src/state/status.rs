//! Timed status changes.

use arrayvec::ArrayVec;

use super::common::{JobId, Tick, TimerId};
use super::equipment::EquipPoints;
use crate::config::EngineConfig;
use crate::stats::Stat;

/// Timed effects that alter stats, equipment rules or skill availability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusKind {
    /// STR, INT and DEX +value.
    Blessing,
    /// AGI +value, movement speed +25%.
    IncreaseAgi,
    /// AGI -value, movement speed -25%.
    DecreaseAgi,
    /// LUK +30.
    Gloria,
    /// AGI and DEX +value%.
    Concentration,
    /// Base experience +value%.
    ExpBoost,
    /// Job experience +value%.
    JobExpBoost,
    /// Max HP ×3 and faster attacks; equipment is locked.
    Berserk,
    StripWeapon,
    StripShield,
    StripArmor,
    StripHelm,
    /// Unlocks tree entries linked to the given job.
    SoulLink(JobId),
    /// Food buff: `stat` +value.
    FoodStat(Stat),
}

impl StatusKind {
    /// Slots this status prevents from being equipped.
    pub fn locked_points(self) -> EquipPoints {
        match self {
            StatusKind::StripWeapon => EquipPoints::HAND_R,
            StatusKind::StripShield => EquipPoints::HAND_L,
            StatusKind::StripArmor => EquipPoints::ARMOR,
            StatusKind::StripHelm => EquipPoints::HEAD_TOP,
            StatusKind::Berserk => EquipPoints::all(),
            _ => EquipPoints::empty(),
        }
    }

    /// Starting or ending the status changes which tree entries are grantable.
    pub fn affects_skill_tree(self) -> bool {
        matches!(self, StatusKind::SoulLink(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveStatus {
    pub kind: StatusKind,
    pub value: i32,
    pub expires_at: Tick,
    pub timer: TimerId,
}

/// Bounded set of active status changes; at most one entry per kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusSet {
    entries: ArrayVec<ActiveStatus, { EngineConfig::MAX_STATUS_CHANGES }>,
}

impl StatusSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: StatusKind) -> Option<&ActiveStatus> {
        self.entries.iter().find(|s| s.kind == kind)
    }

    pub fn value(&self, kind: StatusKind) -> i32 {
        self.get(kind).map_or(0, |s| s.value)
    }

    pub fn is_active(&self, kind: StatusKind) -> bool {
        self.get(kind).is_some()
    }

    /// Inserts or refreshes `status`. Returns the replaced entry, or `Err`
    /// with the rejected entry when the set is full.
    pub fn upsert(&mut self, status: ActiveStatus) -> Result<Option<ActiveStatus>, ActiveStatus> {
        if let Some(existing) = self.entries.iter_mut().find(|s| s.kind == status.kind) {
            let old = *existing;
            *existing = status;
            return Ok(Some(old));
        }
        self.entries
            .try_push(status)
            .map(|()| None)
            .map_err(|err| err.element())
    }

    pub fn remove(&mut self, kind: StatusKind) -> Option<ActiveStatus> {
        let pos = self.entries.iter().position(|s| s.kind == kind)?;
        Some(self.entries.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveStatus> {
        self.entries.iter()
    }

    /// Union of every slot locked by an active status.
    pub fn locked_points(&self) -> EquipPoints {
        self.entries
            .iter()
            .fold(EquipPoints::empty(), |acc, s| acc | s.kind.locked_points())
    }

    pub fn soul_links(&self) -> impl Iterator<Item = JobId> + '_ {
        self.entries.iter().filter_map(|s| match s.kind {
            StatusKind::SoulLink(job) => Some(job),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
