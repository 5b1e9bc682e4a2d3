//! The recompute pass.
//!
//! ```text
//! repair slots ─▶ fresh BonusTable ─▶ job bonus ─▶ item + card scripts
//!   ─▶ combo scripts ─▶ active autobonuses ─▶ status bonuses
//!   ─▶ item-granted skills ─▶ EffectiveStats ─▶ BattleStatus ─▶ weight
//! ```
//!
//! Derived state is a pure function of persistent state, so the pass always
//! starts from an empty table and never patches the previous result.

use tracing::{trace, warn};

use crate::config::EngineConfig;
use crate::engine::CommandError;
use crate::env::{
    JobDefinition, PlayerEnv, ScriptContext, ScriptEngine, ScriptItem, ScriptPhase,
};
use crate::equip::{self, combo, validate};
use crate::notify::{Notification, Outbox, StatusFields};
use crate::skill;
use crate::state::{EquipSlot, InventoryIndex, PlayerState, ScriptId, StateFlags, StatusKind};
use crate::stats::{
    BattleStatus, Bonus, Bonus1, BonusSource, BonusTable, DerivedCaps, DerivedInputs,
    EffectiveStats, Stat, StatLayer, WeaponType, WieldedWeapon,
};

/// Haste granted by Increase Agility, in percent.
const INCREASE_AGI_HASTE: i32 = 25;
/// Slowdown applied by Decrease Agility, in percent.
const DECREASE_AGI_SLOW: i32 = 25;
const GLORIA_LUK: i32 = 30;
const BERSERK_MAX_HP_RATE: i32 = 200;
const BERSERK_ASPD_RATE: i32 = 30;
const OVERWEIGHT: StateFlags = StateFlags::OVERWEIGHT_50.union(StateFlags::OVERWEIGHT_90);

/// Rebuilds every derived value of `state` and reports what changed.
///
/// # Errors
///
/// `Oracle` when the character's job definition or the script engine is
/// missing. Individual scripts that fail are logged and skipped.
pub fn recompute(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    outbox: &mut Outbox,
) -> Result<(), CommandError> {
    let cleared = equip::repair_slots(state, env);
    if !cleared.is_empty() {
        combo::retract(state, cleared, outbox);
    }

    let job = env.job(state.character.job)?;
    let scripts = env.scripts()?;
    let mut table = BonusTable::new();
    for stat in job.job_bonus_at(state.character.job_level) {
        table.stat_bonus(stat, Bonus::flat(1));
    }

    equipment_scripts(state, env, config, scripts, &mut table);

    table.set_source(BonusSource::Armor, None);
    for active in state.combos.iter() {
        run_script(scripts, active.script, state, None, ScriptPhase::Recompute, &mut table);
    }
    for active in state.autobonuses.iter() {
        table.set_source(BonusSource::Armor, active.spec.source);
        run_script(
            scripts,
            active.spec.script,
            state,
            None,
            ScriptPhase::Autobonus,
            &mut table,
        );
    }
    table.set_source(BonusSource::Armor, None);
    status_bonuses(state, &mut table);

    state.diagnostics.capacity_drops += table.capacity_drops;
    state.diagnostics.rejected_bonuses += table.rejected;
    state.bonuses = table;

    let skills_before = state.skills.clone();
    skill::refresh_item_skills(state);
    skill::notify_changes(&skills_before, &state.skills, outbox);

    let stats = EffectiveStats::compute(&state.character.stats, &state.bonuses.stats);
    let inputs = derived_inputs(state, env, config, job, stats);
    let battle = BattleStatus::compute(&inputs, &state.bonuses);

    let fields = StatusFields::diff(&state.battle, &battle);
    let before = std::mem::replace(&mut state.battle, battle);
    if !fields.is_empty() {
        outbox.push(Notification::StatusChanged { fields });
    }

    update_weight(state, env, before.weight_max, outbox);
    clamp_resources(state, &before, outbox);

    trace!(
        character = %state.id(),
        ?fields,
        max_hp = state.battle.max_hp,
        max_sp = state.battle.max_sp,
        "recomputed"
    );
    Ok(())
}

fn run_script<X: ScriptEngine + ?Sized>(
    scripts: &X,
    script: ScriptId,
    state: &PlayerState,
    item: Option<ScriptItem>,
    phase: ScriptPhase,
    table: &mut BonusTable,
) {
    let mut ctx = ScriptContext::new(table, &state.character, item, phase);
    if let Err(err) = scripts.run(script, &mut ctx) {
        warn!(?script, %err, "bonus script failed");
    }
}

/// Runs the scripts of live items and their cards with the source side set
/// per slot. Costume slots and zone-restricted items contribute nothing.
fn equipment_scripts<X: ScriptEngine + ?Sized>(
    state: &PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    scripts: &X,
    table: &mut BonusTable,
) {
    let zone = env.zone(state.character.zone);
    let privileged = config.is_privileged(state.character.group_level);

    for (slot, index) in state.loadout.live.distinct() {
        if slot.is_costume() {
            continue;
        }
        let Some(entry) = state.inventory.get(index) else {
            continue;
        };
        let Ok(item) = env.item(entry.item) else {
            continue;
        };
        if validate::restricted_in_zone(item, zone, privileged) {
            trace!(%index, item = %entry.item, "item disabled in zone");
            continue;
        }

        let host = ScriptItem {
            index,
            id: entry.item,
            refine: entry.refine,
        };
        table.set_source(slot.bonus_source(item.weapon().is_some()), Some(index));
        if let Some(script) = item.equip_script {
            run_script(scripts, script, state, Some(host), ScriptPhase::Recompute, table);
        }
        for card in entry.cards() {
            match env.item(card) {
                Ok(card_def) => {
                    if let Some(script) = card_def.equip_script {
                        let phase = ScriptPhase::Recompute;
                        run_script(scripts, script, state, Some(host), phase, table);
                    }
                }
                Err(err) => warn!(%index, %card, %err, "unknown card skipped"),
            }
        }
    }
}

fn status_bonuses(state: &PlayerState, table: &mut BonusTable) {
    for status in state.statuses.iter() {
        let value = status.value;
        match status.kind {
            StatusKind::Blessing => {
                for stat in [Stat::Str, Stat::Int, Stat::Dex] {
                    table.stat_bonus(stat, Bonus::flat(value));
                }
            }
            StatusKind::IncreaseAgi => {
                table.stat_bonus(Stat::Agi, Bonus::flat(value));
                table.bonus(Bonus1::SpeedRate, INCREASE_AGI_HASTE);
            }
            StatusKind::DecreaseAgi => table.stat_bonus(Stat::Agi, Bonus::flat(-value)),
            StatusKind::Gloria => table.stat_bonus(Stat::Luk, Bonus::flat(GLORIA_LUK)),
            StatusKind::Concentration => {
                table.stat_bonus(Stat::Agi, Bonus::increased(value));
                table.stat_bonus(Stat::Dex, Bonus::increased(value));
            }
            StatusKind::Berserk => {
                table.bonus(Bonus1::MaxHpRate, BERSERK_MAX_HP_RATE);
                table.bonus(Bonus1::AspdRate, BERSERK_ASPD_RATE);
            }
            StatusKind::FoodStat(stat) => table.stat_bonus(stat, Bonus::flat(value)),
            StatusKind::ExpBoost
            | StatusKind::JobExpBoost
            | StatusKind::StripWeapon
            | StatusKind::StripShield
            | StatusKind::StripArmor
            | StatusKind::StripHelm
            | StatusKind::SoulLink(_) => {}
        }
    }
}

fn wielded(
    state: &PlayerState,
    env: &PlayerEnv<'_>,
    index: Option<InventoryIndex>,
    enabled: impl Fn(InventoryIndex) -> bool,
) -> Option<WieldedWeapon> {
    let index = index.filter(|index| enabled(*index))?;
    let entry = state.inventory.get(index)?;
    let weapon = env.item(entry.item).ok()?.weapon()?;
    Some(WieldedWeapon {
        kind: weapon.kind,
        atk: weapon.atk,
        weapon_level: weapon.weapon_level,
        refine: entry.refine,
    })
}

fn derived_inputs(
    state: &PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    job: &JobDefinition,
    stats: EffectiveStats,
) -> DerivedInputs {
    let zone = env.zone(state.character.zone);
    let privileged = config.is_privileged(state.character.group_level);
    let enabled = |index: InventoryIndex| {
        state
            .inventory
            .get(index)
            .and_then(|entry| env.item(entry.item).ok())
            .is_some_and(|item| !validate::restricted_in_zone(item, zone, privileged))
    };

    let right_index = state.equipped(EquipSlot::HandR);
    let left_index = state
        .equipped(EquipSlot::HandL)
        .filter(|index| Some(*index) != right_index);
    let right = wielded(state, env, right_index, &enabled);
    let left = wielded(state, env, left_index, &enabled);

    let (mut armor_def, mut armor_mdef, mut armor_refine) = (0, 0, 0);
    for (slot, index) in state.loadout.live.distinct() {
        if slot.is_costume() || !enabled(index) {
            continue;
        }
        let Some(entry) = state.inventory.get(index) else {
            continue;
        };
        if let Some(armor) = env.item(entry.item).ok().and_then(|item| item.armor()) {
            armor_def += armor.def;
            armor_mdef += armor.mdef;
            armor_refine += i32::from(entry.refine);
        }
    }

    let amotion_right = job.amotion(right.map_or(WeaponType::Fist, |w| w.kind));
    let amotion_left = left.map(|w| job.amotion(w.kind));
    let slow_rate = if state.statuses.is_active(StatusKind::DecreaseAgi) {
        DECREASE_AGI_SLOW
    } else {
        0
    };

    DerivedInputs {
        stats,
        base_level: state.character.base_level,
        upper: job.upper,
        hp_per_level: job.hp_per_level,
        sp_per_level: job.sp_per_level,
        base_weight: job.base_weight,
        right,
        left,
        amotion_right,
        amotion_left,
        armor_def,
        armor_mdef,
        armor_refine,
        riding: state.character.flags.contains(StateFlags::RIDING),
        slow_rate,
        caps: DerivedCaps {
            max_aspd_amotion: config.max_aspd_amotion,
            max_hp: config.max_hp,
            max_sp: config.max_sp,
        },
    }
}

/// Carried weight of the whole inventory. Unknown items weigh nothing.
pub fn carried_weight(state: &PlayerState, env: &PlayerEnv<'_>) -> u32 {
    state
        .inventory
        .iter()
        .filter_map(|(_, entry)| {
            let item = env.item(entry.item).ok()?;
            Some(item.weight.saturating_mul(u32::from(entry.amount)))
        })
        .fold(0u32, u32::saturating_add)
}

fn update_weight(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    previous_max: u32,
    outbox: &mut Outbox,
) {
    let weight = carried_weight(state, env);
    let max = state.battle.weight_max;
    let percent = if max == 0 {
        100
    } else {
        u64::from(weight) * 100 / u64::from(max)
    };

    let flags = &mut state.character.flags;
    let tier_before = *flags & OVERWEIGHT;
    flags.set(StateFlags::OVERWEIGHT_50, percent >= 50);
    flags.set(StateFlags::OVERWEIGHT_90, percent >= 90);
    if *flags & OVERWEIGHT != tier_before {
        trace!(weight, max, tier = state.character.overweight_tier(), "overweight tier changed");
    }

    if weight != state.weight || max != previous_max {
        state.weight = weight;
        outbox.push(Notification::Weight { weight, max });
    }
}

fn clamp_resources(state: &mut PlayerState, before: &BattleStatus, outbox: &mut Outbox) {
    let battle = state.battle;
    let character = &mut state.character;
    let hp = character.hp.min(battle.max_hp);
    let sp = character.sp.min(battle.max_sp);
    if hp != character.hp || battle.max_hp != before.max_hp {
        character.hp = hp;
        outbox.push(Notification::Hp {
            hp,
            max: battle.max_hp,
        });
    }
    if sp != character.sp || battle.max_sp != before.max_sp {
        character.sp = sp;
        outbox.push(Notification::Sp {
            sp,
            max: battle.max_sp,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{EquipPoints, InventoryItem, StatusKind};
    use crate::testkit::{self, items, jobs, scripts};

    fn equip(state: &mut PlayerState, item: InventoryItem) -> InventoryIndex {
        let index = testkit::give(state, item);
        equip::equip(
            state,
            &testkit::env(),
            testkit::config(),
            index,
            EquipPoints::empty(),
            &mut Outbox::new(),
        )
        .unwrap();
        index
    }

    fn refresh(state: &mut PlayerState) -> Outbox {
        let mut outbox = Outbox::new();
        recompute(state, &testkit::env(), testkit::config(), &mut outbox).unwrap();
        outbox
    }

    #[test]
    fn running_twice_changes_nothing() {
        let mut state = testkit::player(jobs::SWORDMAN, 30, 10);
        equip(&mut state, InventoryItem::new(items::HELM, 1));
        refresh(&mut state);
        let snapshot = state.clone();

        let outbox = refresh(&mut state);
        assert_eq!(state, snapshot);
        assert!(outbox.is_empty());
    }

    #[test]
    fn job_bonus_follows_job_level() {
        let mut state = testkit::player(jobs::SWORDMAN, 30, 1);
        assert_eq!(state.bonuses.stats.stack(Stat::Str).flat_sum(), 0);

        state.character.job_level = 6;
        refresh(&mut state);
        assert_eq!(state.bonuses.stats.stack(Stat::Str).flat_sum(), 1);
        assert_eq!(state.bonuses.stats.stack(Stat::Vit).flat_sum(), 1);
    }

    #[test]
    fn card_scripts_run_with_their_host() {
        let mut state = testkit::player(jobs::SWORDMAN, 30, 10);
        let batk = state.battle.batk;
        equip(
            &mut state,
            InventoryItem::new(items::SWORD, 1).with_card(0, items::ANDRE_CARD),
        );
        refresh(&mut state);
        assert_eq!(state.bonuses.get(Bonus1::Atk), 20);
        assert_eq!(state.battle.batk, batk + 20);
        assert_eq!(state.battle.watk_right, 25);
    }

    #[test]
    fn costume_items_give_no_bonus() {
        let mut state = testkit::player(jobs::SWORDMAN, 30, 10);
        equip(&mut state, InventoryItem::new(items::COSTUME_HAT, 1));
        refresh(&mut state);
        assert_eq!(state.bonuses.stats.stack(Stat::Str).flat_sum(), 0);
    }

    #[test]
    fn status_bonuses_layer_on_top() {
        let mut state = testkit::player(jobs::SWORDMAN, 30, 1);
        let timer = state.timers.schedule(
            crate::state::Tick(10_000),
            crate::state::TimerKind::StatusExpiry(StatusKind::Blessing),
        );
        state
            .statuses
            .upsert(crate::state::ActiveStatus {
                kind: StatusKind::Blessing,
                value: 10,
                expires_at: crate::state::Tick(10_000),
                timer,
            })
            .unwrap();
        let hit = state.battle.hit;

        let outbox = refresh(&mut state);
        assert_eq!(state.battle.hit, hit + 10);
        assert!(outbox.iter().any(|n| matches!(
            n,
            Notification::StatusChanged { fields } if fields.contains(StatusFields::HIT)
        )));
    }

    #[test]
    fn weight_tracks_inventory_and_flags_overweight() {
        let mut state = testkit::player(jobs::NOVICE, 1, 1);
        testkit::give(&mut state, InventoryItem::new(items::RED_POTION, 10));
        let outbox = refresh(&mut state);
        assert_eq!(state.weight, 700);
        assert!(outbox.iter().any(|n| matches!(n, Notification::Weight { weight: 700, .. })));
        assert_eq!(state.character.overweight_tier(), 0);

        let max = state.battle.weight_max;
        let potions = u16::try_from(max * 95 / 100 / 70).unwrap();
        testkit::give(&mut state, InventoryItem::new(items::RED_POTION, potions));
        refresh(&mut state);
        assert_eq!(state.character.overweight_tier(), 2);
    }

    #[test]
    fn failing_scripts_are_skipped() {
        let state = testkit::player(jobs::NOVICE, 1, 1);
        let mut table = BonusTable::new();
        run_script(
            testkit::fixture(),
            scripts::BROKEN,
            &state,
            None,
            ScriptPhase::Recompute,
            &mut table,
        );
        assert_eq!(table, BonusTable::new());
    }

    #[test]
    fn hp_is_clamped_to_a_lower_max() {
        let mut state = testkit::player(jobs::SWORDMAN, 50, 10);
        state.character.hp = state.battle.max_hp;
        state.character.job = jobs::NOVICE;
        state.character.job_level = 1;
        refresh(&mut state);
        assert_eq!(state.character.hp, state.battle.max_hp);
    }
}
