//! Autobonus activations and skill cooldowns.

use arrayvec::ArrayVec;

use super::common::{SkillId, Tick, TimerId};
use crate::config::EngineConfig;
use crate::stats::AutobonusSpec;

/// An autobonus that has been triggered and is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveAutobonus {
    pub spec: AutobonusSpec,
    pub expires_at: Tick,
    pub timer: TimerId,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AutobonusSet {
    entries: ArrayVec<ActiveAutobonus, { EngineConfig::MAX_AUTOBONUS }>,
}

impl AutobonusSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, spec: &AutobonusSpec) -> Option<&ActiveAutobonus> {
        self.entries
            .iter()
            .find(|a| a.spec.script == spec.script && a.spec.source == spec.source)
    }

    /// Inserts or refreshes an activation. Returns the replaced entry, or `Err`
    /// with the rejected one when full.
    pub fn upsert(
        &mut self,
        active: ActiveAutobonus,
    ) -> Result<Option<ActiveAutobonus>, ActiveAutobonus> {
        if let Some(existing) = self.entries.iter_mut().find(|a| {
            a.spec.script == active.spec.script && a.spec.source == active.spec.source
        }) {
            let old = *existing;
            *existing = active;
            return Ok(Some(old));
        }
        self.entries
            .try_push(active)
            .map(|()| None)
            .map_err(|err| err.element())
    }

    /// Removes the activations matching `pred`.
    pub fn remove_where(
        &mut self,
        mut pred: impl FnMut(&ActiveAutobonus) -> bool,
    ) -> Vec<ActiveAutobonus> {
        let mut removed = Vec::new();
        self.entries.retain(|a| {
            if pred(a) {
                removed.push(*a);
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveAutobonus> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cooldown {
    pub skill: SkillId,
    pub until: Tick,
    pub timer: TimerId,
}

/// Skills that cannot be used until their deadline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CooldownSet {
    entries: ArrayVec<Cooldown, { EngineConfig::MAX_SKILL_COOLDOWNS }>,
}

impl CooldownSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, skill: SkillId) -> Option<&Cooldown> {
        self.entries.iter().find(|c| c.skill == skill)
    }

    pub fn is_cooling(&self, skill: SkillId, now: Tick) -> bool {
        self.get(skill).is_some_and(|c| c.until > now)
    }

    /// Inserts or extends a cooldown; `Err` when full.
    pub fn upsert(&mut self, cooldown: Cooldown) -> Result<Option<Cooldown>, Cooldown> {
        if let Some(existing) = self.entries.iter_mut().find(|c| c.skill == cooldown.skill) {
            let old = *existing;
            *existing = cooldown;
            return Ok(Some(old));
        }
        self.entries
            .try_push(cooldown)
            .map(|()| None)
            .map_err(|err| err.element())
    }

    pub fn remove(&mut self, skill: SkillId) -> Option<Cooldown> {
        let pos = self.entries.iter().position(|c| c.skill == skill)?;
        Some(self.entries.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cooldown> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
