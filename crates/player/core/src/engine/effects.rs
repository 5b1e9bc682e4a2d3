//! Timed effects, consumables and inventory changes.
//!
//! Everything here schedules or cancels timers on the character's own
//! registry; the matching expiry handling lives in `clock`.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::engine::CommandError;
use crate::env::{PlayerEnv, ScriptEffect, ScriptItem, ScriptPhase, run_hook};
use crate::equip;
use crate::error::DenyReason;
use crate::notify::{Notification, Outbox};
use crate::skill;
use crate::state::{
    ActiveAutobonus, ActiveStatus, Cooldown, InventoryIndex, InventoryItem, PlayerState, SkillId,
    StatusKind, Tick, TimerKind,
};

/// Starts (or refreshes) `kind` for `duration` milliseconds.
///
/// Strip statuses take the item off the slot they lock. Returns the side
/// effects of the unequip hooks this triggered.
///
/// # Errors
///
/// `Dead` for dead characters, `StatusCapacity` when the status table is
/// full.
pub fn start_status(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    kind: StatusKind,
    value: i32,
    duration: u64,
    outbox: &mut Outbox,
) -> Result<Vec<ScriptEffect>, CommandError> {
    if state.character.is_dead() {
        return Err(DenyReason::Dead.into());
    }
    let expires_at = state.clock + duration;
    let timer = state
        .timers
        .schedule(expires_at, TimerKind::StatusExpiry(kind));
    let active = ActiveStatus {
        kind,
        value,
        expires_at,
        timer,
    };
    match state.statuses.upsert(active) {
        Ok(Some(previous)) => {
            state.timers.cancel(previous.timer);
        }
        Ok(None) => {}
        Err(_) => {
            state.timers.cancel(timer);
            state.diagnostics.capacity_drops += 1;
            warn!(?kind, "status table full, status not started");
            return Err(DenyReason::StatusCapacity.into());
        }
    }
    outbox.push(Notification::StatusStarted { kind, expires_at });
    debug!(?kind, value, %expires_at, "status started");

    let mut effects = Vec::new();
    if kind != StatusKind::Berserk {
        for slot in kind.locked_points().slots() {
            let outcome = equip::unequip(state, env, config, slot, true, outbox);
            effects.extend(outcome.effects);
        }
    }
    if kind.affects_skill_tree() {
        skill::resolve(state, env, config, outbox)?;
    }
    Ok(effects)
}

/// Ends `kind` early. Returns whether it was active.
///
/// # Errors
///
/// `Oracle` when ending a soul link cannot re-resolve the skill tree.
pub fn end_status(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    kind: StatusKind,
    outbox: &mut Outbox,
) -> Result<bool, CommandError> {
    let Some(active) = state.statuses.remove(kind) else {
        return Ok(false);
    };
    state.timers.cancel(active.timer);
    outbox.push(Notification::StatusEnded(kind));
    debug!(?kind, "status ended");
    if kind.affects_skill_tree() {
        skill::resolve(state, env, config, outbox)?;
    }
    Ok(true)
}

/// Restores (or drains) HP and SP. Drains never kill; the dead are not
/// healed.
pub fn heal(state: &mut PlayerState, hp: i32, sp: i32, outbox: &mut Outbox) {
    if state.character.is_dead() {
        return;
    }
    let adjust = |current: u32, delta: i32, max: u32, floor: u32| -> u32 {
        let next = i64::from(current) + i64::from(delta);
        next.clamp(i64::from(floor), i64::from(max.max(floor))) as u32
    };
    let battle = state.battle;
    let character = &mut state.character;
    if hp != 0 {
        character.hp = adjust(character.hp, hp, battle.max_hp, 1);
        outbox.push(Notification::Hp {
            hp: character.hp,
            max: battle.max_hp,
        });
    }
    if sp != 0 {
        character.sp = adjust(character.sp, sp, battle.max_sp, 0);
        outbox.push(Notification::Sp {
            sp: character.sp,
            max: battle.max_sp,
        });
    }
}

/// Applies side effects requested by use or unequip hooks, including the
/// follow-ups they trigger. Capacity failures are logged and skipped.
///
/// # Errors
///
/// `Oracle` when a follow-up needs reference data that is missing.
pub fn apply_effects(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    effects: Vec<ScriptEffect>,
    outbox: &mut Outbox,
) -> Result<(), CommandError> {
    let mut queue = VecDeque::from(effects);
    let mut budget = EngineConfig::MAX_RESOLVE_PASSES;
    while let Some(effect) = queue.pop_front() {
        if budget == 0 {
            warn!(pending = queue.len() + 1, "effect chain too long, rest dropped");
            state.diagnostics.capacity_drops += 1;
            break;
        }
        budget -= 1;
        match effect {
            ScriptEffect::StartStatus {
                kind,
                value,
                duration,
            } => match start_status(state, env, config, kind, value, duration, outbox) {
                Ok(follow_ups) => queue.extend(follow_ups),
                Err(CommandError::Denied(reason)) => {
                    debug!(?kind, %reason, "status effect not applied");
                }
                Err(err) => return Err(err),
            },
            ScriptEffect::EndStatus(kind) => {
                end_status(state, env, config, kind, outbox)?;
            }
            ScriptEffect::Heal { hp, sp } => heal(state, hp, sp, outbox),
        }
    }
    Ok(())
}

/// Uses one unit of consumable `index`.
///
/// # Errors
///
/// `NoSuchItem`, `Dead`, `NotConsumable`, or `Oracle` when the item's use
/// script fails (nothing is consumed then).
pub fn use_item(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    index: InventoryIndex,
    outbox: &mut Outbox,
) -> Result<(), CommandError> {
    let entry = *state
        .inventory
        .get(index)
        .ok_or(DenyReason::NoSuchItem)?;
    if state.character.is_dead() {
        return Err(DenyReason::Dead.into());
    }
    let item = env.item(entry.item)?;
    let script = item
        .use_script
        .filter(|_| item.is_consumable())
        .ok_or(DenyReason::NotConsumable)?;

    let hook_item = ScriptItem {
        index,
        id: entry.item,
        refine: entry.refine,
    };
    let effects = run_hook(
        env.scripts()?,
        script,
        &state.character,
        Some(hook_item),
        ScriptPhase::Use,
    )?;

    if state.inventory.consume(index, 1) {
        state
            .timers
            .cancel_where(|kind| *kind == TimerKind::RentalExpiry(index));
        outbox.push(Notification::ItemRemoved { index });
    } else {
        let remaining = state.inventory.get(index).map_or(0, |e| e.amount);
        outbox.push(Notification::ItemConsumed { index, remaining });
    }
    debug!(%index, item = %entry.item, "item used");
    apply_effects(state, env, config, effects, outbox)
}

/// Puts `item` into the inventory, scheduling its rental expiry.
///
/// # Errors
///
/// `InventoryFull`, or `Oracle` for an unknown item id.
pub fn add_item(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    item: InventoryItem,
    outbox: &mut Outbox,
) -> Result<InventoryIndex, CommandError> {
    env.item(item.item)?;
    let index = state
        .inventory
        .add(item)
        .ok_or(DenyReason::InventoryFull)?;
    if let Some(expires_at) = item.expires_at {
        state
            .timers
            .schedule(expires_at.max(state.clock), TimerKind::RentalExpiry(index));
    }
    outbox.push(Notification::ItemAdded { index });
    debug!(%index, item = %item.item, amount = item.amount, "item added");
    Ok(index)
}

/// Takes item `index` out of both loadouts and the inventory. Returns the
/// removed entry and the side effects of its unequip hook.
///
/// # Errors
///
/// `NoSuchItem` when the index is empty.
pub fn remove_item(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    index: InventoryIndex,
    outbox: &mut Outbox,
) -> Result<(InventoryItem, Vec<ScriptEffect>), CommandError> {
    if state.inventory.get(index).is_none() {
        return Err(DenyReason::NoSuchItem.into());
    }
    let effects = equip::release(state, env, index, outbox);
    state.timers.cancel_where(|kind| match kind {
        TimerKind::RentalExpiry(at) => *at == index,
        TimerKind::AutobonusExpiry { source, .. } => *source == Some(index),
        _ => false,
    });
    let removed = state
        .inventory
        .remove(index)
        .ok_or(DenyReason::NoSuchItem)?;
    outbox.push(Notification::ItemRemoved { index });
    debug!(%index, item = %removed.item, "item removed");
    Ok((removed, effects))
}

/// Puts `skill` on cooldown for `duration` milliseconds. Returns `false`
/// when the cooldown table is full.
pub fn start_cooldown(
    state: &mut PlayerState,
    skill: SkillId,
    duration: u64,
    outbox: &mut Outbox,
) -> bool {
    let until = state.clock + duration;
    let timer = state
        .timers
        .schedule(until, TimerKind::SkillCooldown(skill));
    match state.cooldowns.upsert(Cooldown { skill, until, timer }) {
        Ok(previous) => {
            if let Some(previous) = previous {
                state.timers.cancel(previous.timer);
            }
            outbox.push(Notification::CooldownStarted { skill, until });
            debug!(%skill, %until, "cooldown started");
            true
        }
        Err(_) => {
            state.timers.cancel(timer);
            state.diagnostics.capacity_drops += 1;
            warn!(%skill, "cooldown table full, cooldown dropped");
            false
        }
    }
}

/// Activates the registered autobonus at `position` in the bonus table for
/// its duration. Returns the expiry tick, or `None` when the activation
/// table is full.
///
/// # Errors
///
/// `AutobonusNotFound` when no autobonus is registered at `position`.
pub fn trigger_autobonus(
    state: &mut PlayerState,
    position: usize,
    outbox: &mut Outbox,
) -> Result<Option<Tick>, CommandError> {
    let spec = *state
        .bonuses
        .autobonuses
        .get(position)
        .ok_or(DenyReason::AutobonusNotFound)?;
    let expires_at = state.clock + spec.duration;
    let timer = state.timers.schedule(
        expires_at,
        TimerKind::AutobonusExpiry {
            source: spec.source,
            script: spec.script,
        },
    );
    let active = ActiveAutobonus {
        spec,
        expires_at,
        timer,
    };
    match state.autobonuses.upsert(active) {
        Ok(previous) => {
            if let Some(previous) = previous {
                state.timers.cancel(previous.timer);
            }
        }
        Err(_) => {
            state.timers.cancel(timer);
            state.diagnostics.capacity_drops += 1;
            warn!(script = ?spec.script, "autobonus table full, activation dropped");
            return Ok(None);
        }
    }
    outbox.push(Notification::AutobonusStarted {
        script: spec.script,
        expires_at,
    });
    debug!(script = ?spec.script, %expires_at, "autobonus activated");
    Ok(Some(expires_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{EquipPoints, EquipSlot};
    use crate::testkit::{self, items, jobs, skills};

    #[test]
    fn refreshing_a_status_replaces_its_timer() {
        let env = testkit::env();
        let config = testkit::config();
        let mut state = testkit::player(jobs::SWORDMAN, 30, 10);

        start_status(&mut state, &env, config, StatusKind::Gloria, 1, 1_000, &mut Outbox::new())
            .unwrap();
        let first = state.statuses.get(StatusKind::Gloria).unwrap().timer;
        start_status(&mut state, &env, config, StatusKind::Gloria, 1, 5_000, &mut Outbox::new())
            .unwrap();
        let second = state.statuses.get(StatusKind::Gloria).unwrap();

        assert_eq!(state.statuses.len(), 1);
        assert!(state.timers.get(first).is_none());
        assert_eq!(state.timers.get(second.timer).map(|t| t.due), Some(Tick(5_000)));
    }

    #[test]
    fn full_status_table_declines_new_kinds() {
        let env = testkit::env();
        let config = testkit::config();
        let mut state = testkit::player(jobs::SWORDMAN, 30, 10);
        let mut jobs_seen = 0u16;
        while state.statuses.len() < EngineConfig::MAX_STATUS_CHANGES {
            let kind = StatusKind::SoulLink(crate::state::JobId(1_000 + jobs_seen));
            jobs_seen += 1;
            start_status(&mut state, &env, config, kind, 1, 1_000, &mut Outbox::new()).unwrap();
        }
        let timers = state.timers.len();

        let err = start_status(
            &mut state,
            &env,
            config,
            StatusKind::Blessing,
            10,
            1_000,
            &mut Outbox::new(),
        )
        .unwrap_err();
        assert_eq!(err, CommandError::Denied(DenyReason::StatusCapacity));
        assert_eq!(state.timers.len(), timers);
        assert_eq!(state.diagnostics.capacity_drops, 1);
    }

    #[test]
    fn strip_takes_the_weapon_off() {
        let env = testkit::env();
        let config = testkit::config();
        let mut state = testkit::player(jobs::SWORDMAN, 30, 10);
        let sword = testkit::give(&mut state, InventoryItem::new(items::SWORD, 1));
        equip::equip(&mut state, &env, config, sword, EquipPoints::empty(), &mut Outbox::new())
            .unwrap();

        start_status(
            &mut state,
            &env,
            config,
            StatusKind::StripWeapon,
            0,
            10_000,
            &mut Outbox::new(),
        )
        .unwrap();
        assert_eq!(state.equipped(EquipSlot::HandR), None);
        let err =
            equip::equip(&mut state, &env, config, sword, EquipPoints::empty(), &mut Outbox::new())
                .unwrap_err();
        assert_eq!(err, CommandError::Denied(DenyReason::EquipStatus));
    }

    #[test]
    fn potion_heals_and_is_consumed() {
        let env = testkit::env();
        let config = testkit::config();
        let mut state = testkit::player(jobs::SWORDMAN, 30, 10);
        state.character.hp = 10;
        let potions = testkit::give(&mut state, InventoryItem::new(items::RED_POTION, 2));
        let mut outbox = Outbox::new();

        use_item(&mut state, &env, config, potions, &mut outbox).unwrap();
        assert_eq!(state.character.hp, 55);
        assert_eq!(state.inventory.get(potions).map(|e| e.amount), Some(1));
        assert!(outbox.iter().any(|n| *n
            == Notification::ItemConsumed {
                index: potions,
                remaining: 1
            }));

        use_item(&mut state, &env, config, potions, &mut Outbox::new()).unwrap();
        assert!(state.inventory.get(potions).is_none());
    }

    #[test]
    fn equipment_is_not_consumable() {
        let env = testkit::env();
        let mut state = testkit::player(jobs::SWORDMAN, 30, 10);
        let sword = testkit::give(&mut state, InventoryItem::new(items::SWORD, 1));
        let err = use_item(&mut state, &env, testkit::config(), sword, &mut Outbox::new())
            .unwrap_err();
        assert_eq!(err, CommandError::Denied(DenyReason::NotConsumable));
        assert!(state.inventory.get(sword).is_some());
    }

    #[test]
    fn scroll_starts_a_timed_status() {
        let env = testkit::env();
        let mut state = testkit::player(jobs::SWORDMAN, 30, 10);
        state.clock = Tick(1_000);
        let scroll = testkit::give(&mut state, InventoryItem::new(items::BLESS_SCROLL, 1));

        use_item(&mut state, &env, testkit::config(), scroll, &mut Outbox::new()).unwrap();
        let status = state.statuses.get(StatusKind::Blessing).unwrap();
        assert_eq!(status.value, 10);
        assert_eq!(status.expires_at, Tick(241_000));
    }

    #[test]
    fn rental_items_get_an_expiry_timer() {
        let env = testkit::env();
        let mut state = testkit::player(jobs::SWORDMAN, 30, 10);
        let index = add_item(
            &mut state,
            &env,
            InventoryItem::new(items::HELM, 1).with_expiry(Tick(60_000)),
            &mut Outbox::new(),
        )
        .unwrap();
        assert_eq!(state.timers.due(Tick(60_000)).len(), 1);

        remove_item(&mut state, &env, index, &mut Outbox::new()).unwrap();
        assert!(state.timers.is_empty());
    }

    #[test]
    fn cooldowns_past_capacity_are_dropped() {
        let mut state = testkit::player(jobs::SWORDMAN, 30, 10);
        for id in 0..EngineConfig::MAX_SKILL_COOLDOWNS as u16 {
            assert!(start_cooldown(&mut state, SkillId(100 + id), 1_000, &mut Outbox::new()));
        }
        assert!(!start_cooldown(&mut state, skills::BASH, 1_000, &mut Outbox::new()));
        assert_eq!(state.cooldowns.len(), EngineConfig::MAX_SKILL_COOLDOWNS);
        assert_eq!(state.diagnostics.capacity_drops, 1);
    }

    #[test]
    fn unknown_autobonus_position_is_refused() {
        let mut state = testkit::player(jobs::SWORDMAN, 30, 10);
        let err = trigger_autobonus(&mut state, 0, &mut Outbox::new()).unwrap_err();
        assert_eq!(err, CommandError::Denied(DenyReason::AutobonusNotFound));
    }
}
