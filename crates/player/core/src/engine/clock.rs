//! Time: timer dispatch, regeneration and the consistency sweep.
//!
//! The engine never reads a wall clock. The runtime calls [`advance`] with
//! the current tick; due timers fire in deadline order and the character's
//! clock moves to each deadline before its timer fires.

use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::engine::CommandError;
use crate::engine::effects::{self, apply_effects};
use crate::env::PlayerEnv;
use crate::notify::{Notification, Outbox};
use crate::state::{PlayerState, StateFlags, Tick, TimerId, TimerKind};
use crate::stats::accumulator::PeriodicKind;

/// Fires every timer due at or before `now`, then runs regeneration.
/// Returns the number of timers fired.
///
/// # Errors
///
/// `Oracle` when an expiry handler needs reference data that is missing.
pub fn advance(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    now: Tick,
    outbox: &mut Outbox,
) -> Result<usize, CommandError> {
    if now < state.clock {
        trace!(%now, clock = %state.clock, "clock does not run backwards");
        return Ok(0);
    }

    let mut fired = 0;
    loop {
        let due = state.timers.due(now);
        if due.is_empty() {
            break;
        }
        for id in due {
            if let Some(timer) = state.timers.get(id) {
                state.clock = state.clock.max(timer.due);
            }
            if fire_timer(state, env, config, id, outbox)? {
                fired += 1;
            }
        }
    }
    state.clock = now;

    sweep(state);
    regenerate(state, now, outbox);
    Ok(fired)
}

/// Fires timer `id` now. Unknown or cancelled ids are a no-op returning
/// `false`.
///
/// # Errors
///
/// `Oracle` when an expiry handler needs reference data that is missing.
pub fn fire_timer(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    id: TimerId,
    outbox: &mut Outbox,
) -> Result<bool, CommandError> {
    let Some(timer) = state.timers.take(id) else {
        trace!(timer = id.0, "stale timer ignored");
        return Ok(false);
    };
    match timer.kind {
        TimerKind::StatusExpiry(kind) => {
            if state.statuses.get(kind).is_some_and(|s| s.timer == id) {
                state.statuses.remove(kind);
                outbox.push(Notification::StatusEnded(kind));
                debug!(?kind, "status expired");
                if kind.affects_skill_tree() {
                    crate::skill::resolve(state, env, config, outbox)?;
                }
            }
        }
        TimerKind::AutobonusExpiry { script, .. } => {
            if !state.autobonuses.remove_where(|a| a.timer == id).is_empty() {
                outbox.push(Notification::AutobonusEnded(script));
                debug!(?script, "autobonus expired");
            }
        }
        TimerKind::RentalExpiry(index) => {
            let expired = state
                .inventory
                .get(index)
                .and_then(|entry| entry.expires_at)
                .is_some_and(|at| at <= state.clock);
            if expired {
                let (item, hooks) = effects::remove_item(state, env, index, outbox)?;
                debug!(%index, item = %item.item, "rental expired");
                apply_effects(state, env, config, hooks, outbox)?;
            }
        }
        TimerKind::SkillCooldown(skill) => {
            if state.cooldowns.get(skill).is_some_and(|c| c.timer == id) {
                state.cooldowns.remove(skill);
                outbox.push(Notification::CooldownEnded(skill));
            }
        }
    }
    Ok(true)
}

/// Drops timed entries whose timer is gone; they could never expire.
fn sweep(state: &mut PlayerState) {
    let orphaned = |state: &PlayerState, id: TimerId| state.timers.get(id).is_none();

    let statuses: Vec<_> = state
        .statuses
        .iter()
        .filter(|s| orphaned(state, s.timer))
        .map(|s| s.kind)
        .collect();
    for kind in statuses {
        warn!(?kind, "status without timer dropped");
        state.statuses.remove(kind);
        state.diagnostics.repairs += 1;
    }

    let cooldowns: Vec<_> = state
        .cooldowns
        .iter()
        .filter(|c| orphaned(state, c.timer))
        .map(|c| c.skill)
        .collect();
    for skill in cooldowns {
        warn!(%skill, "cooldown without timer dropped");
        state.cooldowns.remove(skill);
        state.diagnostics.repairs += 1;
    }

    let stale: Vec<TimerId> = state
        .autobonuses
        .iter()
        .filter(|a| orphaned(state, a.timer))
        .map(|a| a.timer)
        .collect();
    let dropped = state
        .autobonuses
        .remove_where(|a| stale.contains(&a.timer));
    for active in dropped {
        warn!(script = ?active.spec.script, "autobonus without timer dropped");
        state.diagnostics.repairs += 1;
    }
}

fn periodic_slot(kind: PeriodicKind) -> usize {
    match kind {
        PeriodicKind::HpRegen => 0,
        PeriodicKind::SpRegen => 1,
        PeriodicKind::HpLoss => 2,
        PeriodicKind::SpLoss => 3,
    }
}

/// Elapsed whole intervals since `*since`, moving `*since` forward by them.
fn elapsed_intervals(since: &mut Tick, now: Tick, interval: u64) -> u64 {
    let intervals = since.until(now) / interval.max(1);
    *since = *since + intervals * interval;
    intervals
}

fn regenerate(state: &mut PlayerState, now: Tick, outbox: &mut Outbox) {
    let natural = elapsed_intervals(&mut state.regen.natural, now, EngineConfig::REGEN_INTERVAL);

    let mut periodic = [0i64; 4];
    let mut present = [false; 4];
    for bonus in &state.bonuses.periodic {
        let slot = periodic_slot(bonus.kind);
        present[slot] = true;
        let ticks = elapsed_intervals(
            &mut state.regen.periodic[slot],
            now,
            u64::from(bonus.interval),
        );
        let ticks = i64::try_from(ticks).unwrap_or(i64::MAX);
        periodic[slot] = i64::from(bonus.value).saturating_mul(ticks);
    }
    for (slot, active) in present.iter().enumerate() {
        if !active {
            state.regen.periodic[slot] = now;
        }
    }

    let character = &state.character;
    if character.is_dead() {
        return;
    }
    let (mut hp_gain, mut sp_gain) = (0i64, 0i64);
    if natural > 0 && character.overweight_tier() == 0 {
        let factor = if character.flags.contains(StateFlags::SITTING) {
            2
        } else {
            1
        };
        let natural = i64::try_from(natural).unwrap_or(i64::MAX);
        hp_gain = i64::from(state.battle.hp_regen).saturating_mul(natural * factor);
        sp_gain = i64::from(state.battle.sp_regen).saturating_mul(natural * factor);
    }
    hp_gain = hp_gain + periodic[0] - periodic[2];
    sp_gain = sp_gain + periodic[1] - periodic[3];
    if hp_gain == 0 && sp_gain == 0 {
        return;
    }

    let battle = state.battle;
    let character = &mut state.character;
    let apply = |current: u32, delta: i64, max: u32, floor: u32| -> u32 {
        (i64::from(current) + delta).clamp(i64::from(floor), i64::from(max.max(floor))) as u32
    };
    if hp_gain != 0 {
        let hp = apply(character.hp, hp_gain, battle.max_hp, 1);
        if hp != character.hp {
            character.hp = hp;
            outbox.push(Notification::Hp {
                hp,
                max: battle.max_hp,
            });
        }
    }
    if sp_gain != 0 {
        let sp = apply(character.sp, sp_gain, battle.max_sp, 0);
        if sp != character.sp {
            character.sp = sp;
            outbox.push(Notification::Sp {
                sp,
                max: battle.max_sp,
            });
        }
    }
}
