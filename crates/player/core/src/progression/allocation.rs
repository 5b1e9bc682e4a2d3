//! Status-point allocation and stat resets.

use tracing::debug;

use crate::config::EngineConfig;
use crate::engine::CommandError;
use crate::env::PlayerEnv;
use crate::error::DenyReason;
use crate::notify::{Notification, Outbox};
use crate::state::PlayerState;
use crate::stats::{MIN_STAT, Stat, StatCaps};

/// Raises `stat` by up to `amount`, stopping at the job's cap.
///
/// Nothing changes when the points do not cover the whole (capped) increase.
///
/// # Errors
///
/// `StatAtMax` at the cap, `InsufficientStatPoints` when unaffordable.
pub fn allocate_stat(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    stat: Stat,
    amount: u16,
    outbox: &mut Outbox,
) -> Result<u16, CommandError> {
    let caps = env.job(state.character.job)?.max_stats;
    let character = &mut state.character;
    let current = character.stats.get(stat);
    if current >= caps.get(stat) {
        return Err(DenyReason::StatAtMax.into());
    }
    if amount == 0 {
        return Ok(current);
    }

    let target = current.saturating_add(amount).min(caps.get(stat));
    let cost = config
        .stat_cost
        .points_needed(current, i32::from(target - current));
    if cost > character.status_points {
        return Err(DenyReason::InsufficientStatPoints.into());
    }

    let value = character.stats.set(stat, target, &caps);
    character.status_points -= cost;
    outbox.push(Notification::StatChanged { stat, value });
    outbox.push(Notification::StatusPoints(character.status_points));
    debug!(?stat, value, cost, "stat allocated");
    Ok(value)
}

/// Returns every primary stat to 1 and refunds the points spent on them.
pub fn reset_stats(state: &mut PlayerState, config: &EngineConfig, outbox: &mut Outbox) -> u32 {
    let character = &mut state.character;
    let mut refunded = 0;
    for (stat, value) in character.stats.iter().collect::<Vec<_>>() {
        if value == MIN_STAT {
            continue;
        }
        refunded += config.stat_cost.spent_on(value);
        character.stats.set(stat, MIN_STAT, &StatCaps::default());
        outbox.push(Notification::StatChanged {
            stat,
            value: MIN_STAT,
        });
    }
    if refunded > 0 {
        character.status_points += refunded;
        outbox.push(Notification::StatusPoints(character.status_points));
        debug!(refunded, "stats reset");
    }
    refunded
}

/// Clamps stats into `job`'s caps, refunding the points above each cap.
pub(crate) fn clamp_to_job(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    outbox: &mut Outbox,
) -> Result<u32, CommandError> {
    let caps = env.job(state.character.job)?.max_stats;
    let character = &mut state.character;
    let before = character.stats;
    let moved = character.stats.clamp_to(&caps);
    let mut refunded = 0;
    for stat in moved {
        let (old, new) = (before.get(stat), character.stats.get(stat));
        if old > new {
            refunded += config
                .stat_cost
                .points_needed(old, i32::from(new) - i32::from(old));
        }
        outbox.push(Notification::StatChanged { stat, value: new });
    }
    if refunded > 0 {
        character.status_points += refunded;
        outbox.push(Notification::StatusPoints(character.status_points));
    }
    Ok(refunded)
}
