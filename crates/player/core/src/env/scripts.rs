//! Opaque script boundary.
//!
//! Item, card, combo, autobonus and consumable effects are scripts owned by a
//! [`ScriptEngine`]. The engine only promises to invoke them with a
//! [`ScriptContext`]; what a script does is up to the implementation.

use tracing::debug;

use super::error::OracleError;
use crate::state::{Character, InventoryIndex, ItemId, ScriptId, SkillId, StatusKind};
use crate::stats::{Bonus1, Bonus2, Bonus3, Bonus4, Bonus5, BonusTable};

pub trait ScriptEngine: Send + Sync {
    /// Runs `script` against `ctx`.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::ScriptNotFound` for unknown handles and
    /// `OracleError::ScriptFailed` when the script cannot complete. Bonuses
    /// written before the failure stay in the table.
    fn run(&self, script: ScriptId, ctx: &mut ScriptContext<'_>) -> Result<(), OracleError>;
}

/// Why a script is being invoked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptPhase {
    /// Equipment, card or combo bonuses during a recompute pass.
    Recompute,
    /// An active autobonus during a recompute pass.
    Autobonus,
    /// A consumable being used.
    Use,
    /// An item's unequip hook.
    Unequip,
}

/// The item whose script is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScriptItem {
    pub index: InventoryIndex,
    pub id: ItemId,
    pub refine: u8,
}

/// Side effects a script requests beyond bonus writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptEffect {
    StartStatus {
        kind: StatusKind,
        value: i32,
        duration: u64,
    },
    EndStatus(StatusKind),
    Heal {
        hp: i32,
        sp: i32,
    },
}

/// What a script may read and write while it runs.
pub struct ScriptContext<'a> {
    bonuses: &'a mut BonusTable,
    character: &'a Character,
    item: Option<ScriptItem>,
    phase: ScriptPhase,
    effects: Vec<ScriptEffect>,
}

impl<'a> ScriptContext<'a> {
    pub fn new(
        bonuses: &'a mut BonusTable,
        character: &'a Character,
        item: Option<ScriptItem>,
        phase: ScriptPhase,
    ) -> Self {
        Self {
            bonuses,
            character,
            item,
            phase,
            effects: Vec::new(),
        }
    }

    pub fn character(&self) -> &Character {
        self.character
    }

    pub fn item(&self) -> Option<ScriptItem> {
        self.item
    }

    /// Refine level of the running item, zero for item-less scripts.
    pub fn refine(&self) -> u8 {
        self.item.map_or(0, |item| item.refine)
    }

    pub fn phase(&self) -> ScriptPhase {
        self.phase
    }

    pub fn bonus(&mut self, kind: Bonus1, value: i32) {
        self.bonuses.bonus(kind, value);
    }

    pub fn bonus2(&mut self, kind: Bonus2, a: i32, value: i32) {
        self.bonuses.bonus2(kind, a, value);
    }

    pub fn bonus3(&mut self, kind: Bonus3, a: i32, b: i32, value: i32) {
        self.bonuses.bonus3(kind, a, b, value);
    }

    pub fn bonus4(&mut self, kind: Bonus4, a: i32, b: i32, c: i32, value: i32) {
        self.bonuses.bonus4(kind, a, b, c, value);
    }

    pub fn bonus5(&mut self, kind: Bonus5, a: i32, b: i32, c: i32, d: i32, value: i32) {
        self.bonuses.bonus5(kind, a, b, c, d, value);
    }

    pub fn grant_skill(&mut self, skill: SkillId, level: u8) {
        self.bonuses
            .bonus2(Bonus2::GrantSkill, i32::from(skill.0), i32::from(level));
    }

    /// Registers an autobonus. Only equipment scripts may register one.
    pub fn autobonus(&mut self, script: ScriptId, rate: u16, duration: u64) {
        if self.phase != ScriptPhase::Recompute {
            debug!(?script, phase = ?self.phase, "autobonus ignored outside equipment scripts");
            return;
        }
        self.bonuses.autobonus(script, rate, duration);
    }

    pub fn start_status(&mut self, kind: StatusKind, value: i32, duration: u64) {
        self.push_effect(ScriptEffect::StartStatus {
            kind,
            value,
            duration,
        });
    }

    pub fn end_status(&mut self, kind: StatusKind) {
        self.push_effect(ScriptEffect::EndStatus(kind));
    }

    pub fn heal(&mut self, hp: i32, sp: i32) {
        self.push_effect(ScriptEffect::Heal { hp, sp });
    }

    /// Effects are only honoured for use and unequip hooks; bonus passes must
    /// not mutate anything but the table.
    fn push_effect(&mut self, effect: ScriptEffect) {
        match self.phase {
            ScriptPhase::Use | ScriptPhase::Unequip => self.effects.push(effect),
            ScriptPhase::Recompute | ScriptPhase::Autobonus => {
                debug!(?effect, "side effect ignored during recompute");
            }
        }
    }

    pub fn into_effects(self) -> Vec<ScriptEffect> {
        self.effects
    }
}

/// Runs a hook whose bonus writes are discarded, returning the side effects
/// it requested.
///
/// # Errors
///
/// Propagates the script engine's failure.
pub fn run_hook<X: ScriptEngine + ?Sized>(
    scripts: &X,
    script: ScriptId,
    character: &Character,
    item: Option<ScriptItem>,
    phase: ScriptPhase,
) -> Result<Vec<ScriptEffect>, OracleError> {
    let mut scratch = BonusTable::new();
    let mut ctx = ScriptContext::new(&mut scratch, character, item, phase);
    scripts.run(script, &mut ctx)?;
    Ok(ctx.into_effects())
}
