//! Per-character timer registry.
//!
//! Timers are owned by the character they belong to, so dropping a session
//! drops every pending callback with it. Firing an id that is no longer
//! registered is a no-op.

use std::collections::BTreeMap;

use super::common::{InventoryIndex, ScriptId, SkillId, Tick, TimerId};
use super::status::StatusKind;

/// What happens when a timer fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    StatusExpiry(StatusKind),
    AutobonusExpiry {
        source: Option<InventoryIndex>,
        script: ScriptId,
    },
    RentalExpiry(InventoryIndex),
    SkillCooldown(SkillId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timer {
    pub due: Tick,
    pub kind: TimerKind,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimerRegistry {
    next_id: u32,
    timers: BTreeMap<TimerId, Timer>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Tick, kind: TimerKind) -> TimerId {
        self.next_id = self.next_id.wrapping_add(1);
        let id = TimerId(self.next_id);
        self.timers.insert(id, Timer { due, kind });
        id
    }

    /// Cancels `id`; `false` when it was not pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    /// Cancels every pending timer matching `pred`, returning how many went.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&TimerKind) -> bool) -> usize {
        let before = self.timers.len();
        self.timers.retain(|_, timer| !pred(&timer.kind));
        before - self.timers.len()
    }

    pub fn get(&self, id: TimerId) -> Option<&Timer> {
        self.timers.get(&id)
    }

    /// Removes and returns the timer so it fires exactly once.
    pub fn take(&mut self, id: TimerId) -> Option<Timer> {
        self.timers.remove(&id)
    }

    /// Ids due at `now`, earliest first.
    pub fn due(&self, now: Tick) -> Vec<TimerId> {
        let mut due: Vec<(Tick, TimerId)> = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.due <= now)
            .map(|(id, timer)| (timer.due, *id))
            .collect();
        due.sort();
        due.into_iter().map(|(_, id)| id).collect()
    }

    pub fn next_due(&self) -> Option<Tick> {
        self.timers.values().map(|timer| timer.due).min()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }
}
