//! Outbound notifications.
//!
//! Every externally observable change produced by a command is described by a
//! [`Notification`]. Commands collect them in an [`Outbox`], which keeps at
//! most one notification per observable value so a transaction never reports
//! the same change twice.

use bitflags::bitflags;

use crate::state::{
    ComboId, EquipPoints, InventoryIndex, JobId, ScriptId, SkillId, SkillLevel, StatusKind, Tick,
};
use crate::stats::{BattleStatus, Stat};

bitflags! {
    /// Which derived battle values changed during a recompute pass.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct StatusFields: u32 {
        const BATK          = 1 << 0;
        const WATK          = 1 << 1;
        const MATK          = 1 << 2;
        const DEF           = 1 << 3;
        const MDEF          = 1 << 4;
        const HIT           = 1 << 5;
        const FLEE          = 1 << 6;
        const PERFECT_DODGE = 1 << 7;
        const CRITICAL      = 1 << 8;
        const ASPD          = 1 << 9;
        const MAX_HP        = 1 << 10;
        const MAX_SP        = 1 << 11;
        const SPEED         = 1 << 12;
        const REGEN         = 1 << 13;
        const WEIGHT_MAX    = 1 << 14;
        const ELEMENT       = 1 << 15;
    }
}

impl StatusFields {
    /// Field-by-field comparison of two battle statuses.
    pub fn diff(before: &BattleStatus, after: &BattleStatus) -> Self {
        let mut fields = StatusFields::empty();
        let mut mark = |changed: bool, flag: StatusFields| {
            if changed {
                fields |= flag;
            }
        };
        mark(before.batk != after.batk, StatusFields::BATK);
        mark(
            before.watk_right != after.watk_right || before.watk_left != after.watk_left,
            StatusFields::WATK,
        );
        mark(
            before.matk_min != after.matk_min || before.matk_max != after.matk_max,
            StatusFields::MATK,
        );
        mark(
            before.def != after.def || before.def2 != after.def2,
            StatusFields::DEF,
        );
        mark(
            before.mdef != after.mdef || before.mdef2 != after.mdef2,
            StatusFields::MDEF,
        );
        mark(before.hit != after.hit, StatusFields::HIT);
        mark(before.flee != after.flee, StatusFields::FLEE);
        mark(
            before.perfect_dodge != after.perfect_dodge,
            StatusFields::PERFECT_DODGE,
        );
        mark(before.critical != after.critical, StatusFields::CRITICAL);
        mark(before.amotion != after.amotion, StatusFields::ASPD);
        mark(before.max_hp != after.max_hp, StatusFields::MAX_HP);
        mark(before.max_sp != after.max_sp, StatusFields::MAX_SP);
        mark(before.speed != after.speed, StatusFields::SPEED);
        mark(
            before.hp_regen != after.hp_regen || before.sp_regen != after.sp_regen,
            StatusFields::REGEN,
        );
        mark(before.weight_max != after.weight_max, StatusFields::WEIGHT_MAX);
        mark(
            before.atk_ele != after.atk_ele || before.def_ele != after.def_ele,
            StatusFields::ELEMENT,
        );
        fields
    }
}

/// Who needs to hear about a change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Audience {
    /// Only the player's own client.
    SelfOnly,
    /// The client and every peer tracking the character (party, guild).
    Peers,
}

/// An observable change, carrying the new value where there is one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Notification {
    StatusChanged { fields: StatusFields },
    StatChanged { stat: Stat, value: u16 },
    StatusPoints(u32),
    SkillPoints(u32),
    BaseExp(u64),
    JobExp(u64),
    BaseLevelUp { level: u16 },
    JobLevelUp { level: u16 },
    Hp { hp: u32, max: u32 },
    Sp { sp: u32, max: u32 },
    Weight { weight: u32, max: u32 },
    Equipped { index: InventoryIndex, slots: EquipPoints },
    Unequipped { index: InventoryIndex, slots: EquipPoints },
    Staged { index: InventoryIndex, slots: EquipPoints },
    Unstaged { index: InventoryIndex, slots: EquipPoints },
    ComboActivated(ComboId),
    ComboRetracted(ComboId),
    SkillChanged { skill: SkillId, level: SkillLevel },
    SkillRemoved(SkillId),
    SkillTreeChanged,
    JobChanged { job: JobId },
    StatusStarted { kind: StatusKind, expires_at: Tick },
    StatusEnded(StatusKind),
    AutobonusStarted { script: ScriptId, expires_at: Tick },
    AutobonusEnded(ScriptId),
    CooldownStarted { skill: SkillId, until: Tick },
    CooldownEnded(SkillId),
    ItemAdded { index: InventoryIndex },
    ItemConsumed { index: InventoryIndex, remaining: u16 },
    ItemRemoved { index: InventoryIndex },
    Died,
    Respawned,
}

/// Identity of the observable value a notification describes. Two
/// notifications with the same key describe the same value; the later one
/// wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ValueKey {
    Status,
    Stat(Stat),
    StatusPoints,
    SkillPoints,
    BaseExp,
    JobExp,
    Hp,
    Sp,
    Weight,
    Skill(SkillId),
    SkillTree,
}

impl Notification {
    pub fn audience(&self) -> Audience {
        match self {
            Notification::BaseLevelUp { .. }
            | Notification::JobLevelUp { .. }
            | Notification::Hp { .. }
            | Notification::JobChanged { .. }
            | Notification::Equipped { .. }
            | Notification::Unequipped { .. }
            | Notification::Died
            | Notification::Respawned => Audience::Peers,
            _ => Audience::SelfOnly,
        }
    }

    fn value_key(&self) -> Option<ValueKey> {
        Some(match self {
            Notification::StatusChanged { .. } => ValueKey::Status,
            Notification::StatChanged { stat, .. } => ValueKey::Stat(*stat),
            Notification::StatusPoints(_) => ValueKey::StatusPoints,
            Notification::SkillPoints(_) => ValueKey::SkillPoints,
            Notification::BaseExp(_) => ValueKey::BaseExp,
            Notification::JobExp(_) => ValueKey::JobExp,
            Notification::Hp { .. } => ValueKey::Hp,
            Notification::Sp { .. } => ValueKey::Sp,
            Notification::Weight { .. } => ValueKey::Weight,
            Notification::SkillChanged { skill, .. } | Notification::SkillRemoved(skill) => {
                ValueKey::Skill(*skill)
            }
            Notification::SkillTreeChanged => ValueKey::SkillTree,
            _ => return None,
        })
    }
}

/// Notifications collected during one transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outbox {
    entries: Vec<Notification>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `notification`.
    ///
    /// Value notifications replace an earlier one for the same value in
    /// place; status masks are merged; repeated events are dropped.
    pub fn push(&mut self, notification: Notification) {
        if let Some(key) = notification.value_key()
            && let Some(existing) = self
                .entries
                .iter_mut()
                .find(|n| n.value_key() == Some(key))
        {
            *existing = match (*existing, notification) {
                (
                    Notification::StatusChanged { fields: old },
                    Notification::StatusChanged { fields: new },
                ) => Notification::StatusChanged { fields: old | new },
                (_, newer) => newer,
            };
            return;
        }
        if self.entries.contains(&notification) {
            return;
        }
        self.entries.push(notification);
    }

    pub fn extend(&mut self, notifications: impl IntoIterator<Item = Notification>) {
        for notification in notifications {
            self.push(notification);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Notification> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_masks_merge_into_one_notification() {
        let mut outbox = Outbox::new();
        outbox.push(Notification::StatusChanged {
            fields: StatusFields::BATK,
        });
        outbox.push(Notification::Died);
        outbox.push(Notification::StatusChanged {
            fields: StatusFields::MAX_HP,
        });

        assert_eq!(
            outbox.into_vec(),
            vec![
                Notification::StatusChanged {
                    fields: StatusFields::BATK | StatusFields::MAX_HP
                },
                Notification::Died,
            ]
        );
    }

    #[test]
    fn later_values_replace_earlier_ones() {
        let mut outbox = Outbox::new();
        outbox.push(Notification::StatusPoints(10));
        outbox.push(Notification::StatusPoints(7));
        outbox.push(Notification::BaseLevelUp { level: 2 });
        outbox.push(Notification::BaseLevelUp { level: 2 });
        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox.iter().next(), Some(&Notification::StatusPoints(7)));
    }

    #[test]
    fn diff_reports_only_changed_fields() {
        let before = BattleStatus::default();
        let after = BattleStatus {
            hit: 5,
            max_sp: 40,
            ..BattleStatus::default()
        };
        assert_eq!(
            StatusFields::diff(&before, &after),
            StatusFields::HIT | StatusFields::MAX_SP
        );
    }
}
