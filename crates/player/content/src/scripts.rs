//! Declarative bonus scripts.
//!
//! A script is a list of steps: bonus calls at any arity, skill grants,
//! autobonus registrations and the side effects consumables request. Steps
//! may be guarded by conditions on the running item and the acting character,
//! which covers refine-dependent and job-dependent bonuses without an
//! embedded interpreter.

use std::collections::HashMap;

use player_core::env::{OracleError, ScriptContext, ScriptEngine};
use player_core::state::{JobId, ScriptId, SkillId, StatusKind};
use player_core::stats::{Bonus1, Bonus2, Bonus3, Bonus4, Bonus5};

/// Guard on a [`ScriptStep::When`] block.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Condition {
    RefineAtLeast(u8),
    BaseLevelAtLeast(u16),
    JobLevelAtLeast(u16),
    JobIs(JobId),
    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl Condition {
    pub fn holds(&self, ctx: &ScriptContext<'_>) -> bool {
        let character = ctx.character();
        match self {
            Condition::RefineAtLeast(level) => ctx.refine() >= *level,
            Condition::BaseLevelAtLeast(level) => character.base_level >= *level,
            Condition::JobLevelAtLeast(level) => character.job_level >= *level,
            Condition::JobIs(job) => character.job == *job,
            Condition::Not(inner) => !inner.holds(ctx),
            Condition::All(all) => all.iter().all(|c| c.holds(ctx)),
            Condition::Any(any) => any.iter().any(|c| c.holds(ctx)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScriptStep {
    Bonus(Bonus1, i32),
    Bonus2(Bonus2, i32, i32),
    Bonus3(Bonus3, i32, i32, i32),
    Bonus4(Bonus4, i32, i32, i32, i32),
    Bonus5(Bonus5, i32, i32, i32, i32, i32),
    /// `value` multiplied by the running item's refine level.
    PerRefine(Bonus1, i32),
    GrantSkill(SkillId, u8),
    Autobonus {
        script: ScriptId,
        rate: u16,
        duration: u64,
    },
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
    When {
        condition: Condition,
        then: Vec<ScriptStep>,
        #[cfg_attr(feature = "serde", serde(default))]
        otherwise: Vec<ScriptStep>,
    },
}

/// One named script as stored in content files.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScriptSpec {
    pub id: ScriptId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    pub steps: Vec<ScriptStep>,
}

/// [`ScriptEngine`] over declarative scripts.
#[derive(Debug, Default)]
pub struct ScriptBook {
    scripts: HashMap<ScriptId, ScriptSpec>,
}

/// Nesting limit for `When` blocks.
const MAX_DEPTH: usize = 16;

impl ScriptBook {
    pub fn new(scripts: impl IntoIterator<Item = ScriptSpec>) -> Self {
        Self {
            scripts: scripts.into_iter().map(|spec| (spec.id, spec)).collect(),
        }
    }

    pub fn get(&self, id: ScriptId) -> Option<&ScriptSpec> {
        self.scripts.get(&id)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    fn exec(
        &self,
        script: ScriptId,
        steps: &[ScriptStep],
        ctx: &mut ScriptContext<'_>,
        depth: usize,
    ) -> Result<(), OracleError> {
        if depth > MAX_DEPTH {
            return Err(OracleError::ScriptFailed {
                script,
                reason: format!("conditions nested deeper than {MAX_DEPTH}"),
            });
        }
        for step in steps {
            match step {
                ScriptStep::Bonus(kind, value) => ctx.bonus(*kind, *value),
                ScriptStep::Bonus2(kind, a, value) => ctx.bonus2(*kind, *a, *value),
                ScriptStep::Bonus3(kind, a, b, value) => ctx.bonus3(*kind, *a, *b, *value),
                ScriptStep::Bonus4(kind, a, b, c, value) => {
                    ctx.bonus4(*kind, *a, *b, *c, *value)
                }
                ScriptStep::Bonus5(kind, a, b, c, d, value) => {
                    ctx.bonus5(*kind, *a, *b, *c, *d, *value)
                }
                ScriptStep::PerRefine(kind, value) => {
                    let refine = i32::from(ctx.refine());
                    if refine > 0 {
                        ctx.bonus(*kind, value.saturating_mul(refine));
                    }
                }
                ScriptStep::GrantSkill(skill, level) => ctx.grant_skill(*skill, *level),
                ScriptStep::Autobonus {
                    script,
                    rate,
                    duration,
                } => ctx.autobonus(*script, *rate, *duration),
                ScriptStep::StartStatus {
                    kind,
                    value,
                    duration,
                } => ctx.start_status(*kind, *value, *duration),
                ScriptStep::EndStatus(kind) => ctx.end_status(*kind),
                ScriptStep::Heal { hp, sp } => ctx.heal(*hp, *sp),
                ScriptStep::When {
                    condition,
                    then,
                    otherwise,
                } => {
                    let branch = if condition.holds(ctx) { then } else { otherwise };
                    self.exec(script, branch, ctx, depth + 1)?;
                }
            }
        }
        Ok(())
    }
}

impl ScriptEngine for ScriptBook {
    fn run(&self, script: ScriptId, ctx: &mut ScriptContext<'_>) -> Result<(), OracleError> {
        let spec = self
            .scripts
            .get(&script)
            .ok_or(OracleError::ScriptNotFound(script))?;
        self.exec(script, &spec.steps, ctx, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use player_core::env::{ScriptEffect, ScriptItem, ScriptPhase};
    use player_core::state::{AccountId, Character, CharacterId, InventoryIndex, ItemId};
    use player_core::stats::BonusTable;

    fn book() -> ScriptBook {
        ScriptBook::new([
            ScriptSpec {
                id: ScriptId(1),
                name: "refined blade".into(),
                steps: vec![
                    ScriptStep::Bonus(Bonus1::Str, 2),
                    ScriptStep::PerRefine(Bonus1::Atk, 3),
                    ScriptStep::When {
                        condition: Condition::RefineAtLeast(7),
                        then: vec![ScriptStep::Bonus(Bonus1::Critical, 5)],
                        otherwise: vec![ScriptStep::Bonus(Bonus1::Hit, 1)],
                    },
                ],
            },
            ScriptSpec {
                id: ScriptId(2),
                name: "potion".into(),
                steps: vec![ScriptStep::Heal { hp: 45, sp: 0 }],
            },
        ])
    }

    fn item(refine: u8) -> Option<ScriptItem> {
        Some(ScriptItem {
            index: InventoryIndex(0),
            id: ItemId(1151),
            refine,
        })
    }

    #[test]
    fn refine_drives_conditional_bonuses() {
        let character = Character::new(CharacterId(1), AccountId(1), "Tester");
        let book = book();

        let mut low = BonusTable::new();
        let mut ctx = ScriptContext::new(&mut low, &character, item(4), ScriptPhase::Recompute);
        book.run(ScriptId(1), &mut ctx).unwrap();
        assert_eq!(low.get(Bonus1::Atk), 12);
        assert_eq!(low.get(Bonus1::Hit), 1);
        assert_eq!(low.get(Bonus1::Critical), 0);

        let mut high = BonusTable::new();
        let mut ctx = ScriptContext::new(&mut high, &character, item(7), ScriptPhase::Recompute);
        book.run(ScriptId(1), &mut ctx).unwrap();
        assert_eq!(high.get(Bonus1::Atk), 21);
        assert_eq!(high.get(Bonus1::Critical), 5);
    }

    #[test]
    fn use_scripts_request_effects() {
        let character = Character::new(CharacterId(1), AccountId(1), "Tester");
        let mut table = BonusTable::new();
        let mut ctx = ScriptContext::new(&mut table, &character, None, ScriptPhase::Use);
        book().run(ScriptId(2), &mut ctx).unwrap();
        assert_eq!(ctx.into_effects(), vec![ScriptEffect::Heal { hp: 45, sp: 0 }]);
    }

    #[test]
    fn unknown_scripts_fail() {
        let character = Character::new(CharacterId(1), AccountId(1), "Tester");
        let mut table = BonusTable::new();
        let mut ctx = ScriptContext::new(&mut table, &character, None, ScriptPhase::Use);
        assert_eq!(
            book().run(ScriptId(9), &mut ctx),
            Err(OracleError::ScriptNotFound(ScriptId(9)))
        );
    }
}
