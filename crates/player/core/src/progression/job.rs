//! Job change transition.

use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::engine::CommandError;
use crate::env::{JobTier, PlayerEnv, ScriptEffect, UpperKind};
use crate::equip;
use crate::error::DenyReason;
use crate::notify::{Notification, Outbox};
use crate::skill;
use crate::state::{JobId, PlayerState};

use super::allocation::{clamp_to_job, reset_stats};

/// Moves the character to `new_job`.
///
/// Job level and experience restart, items the new job cannot use come off,
/// skills outside the new tree are refunded and the transcendence stipend is
/// granted or withdrawn when the upper boundary is crossed. Returns the side
/// effects of unequip hooks for the caller to apply.
///
/// # Errors
///
/// `Dead`, `SameJob` or `JobNotFound`.
pub fn change_job(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    new_job: JobId,
    outbox: &mut Outbox,
) -> Result<Vec<ScriptEffect>, CommandError> {
    if state.character.is_dead() {
        return Err(DenyReason::Dead.into());
    }
    if new_job == state.character.job {
        return Err(DenyReason::SameJob.into());
    }
    let target = env.job(new_job).map_err(|_| DenyReason::JobNotFound)?;
    let current = env.job(state.character.job)?;

    let character = &mut state.character;
    if target.tier == JobTier::Second && current.tier < JobTier::Second {
        character.change_level_2nd = character.job_level;
    }
    if target.tier == JobTier::Third && current.tier < JobTier::Third {
        character.change_level_3rd = character.job_level;
    }

    let entering = target.upper == UpperKind::Upper && current.upper != UpperKind::Upper;
    let leaving = current.upper == UpperKind::Upper && target.upper != UpperKind::Upper;
    if entering {
        character.status_points += config.upper_stipend;
    } else if leaving {
        if character.status_points < config.upper_stipend {
            warn!(
                points = character.status_points,
                stipend = config.upper_stipend,
                "stipend already spent, resetting stats"
            );
            reset_stats(state, config, outbox);
        }
        let character = &mut state.character;
        character.status_points = character.status_points.saturating_sub(config.upper_stipend);
    }
    if entering || leaving {
        outbox.push(Notification::StatusPoints(state.character.status_points));
    }

    let from = state.character.job;
    let character = &mut state.character;
    character.job = new_job;
    character.job_level = 1;
    character.job_exp = 0;
    outbox.push(Notification::JobExp(0));

    clamp_to_job(state, env, config, outbox)?;
    skill::prune_for_job(state, env, new_job, outbox);
    let effects = equip::unequip_unusable(state, env, outbox)?;
    skill::resolve(state, env, config, outbox)?;

    outbox.push(Notification::JobChanged { job: new_job });
    info!(character = %state.id(), %from, to = %new_job, "job changed");
    Ok(effects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{EquipPoints, EquipSlot, InventoryItem, SkillLevel};
    use crate::testkit::{self, items, jobs, skills};

    #[test]
    fn promotion_records_the_change_level_and_restarts_job_progress() {
        let env = testkit::env();
        let mut state = testkit::player(jobs::SWORDMAN, 50, 40);
        state.character.job_exp = 1_234;

        change_job(&mut state, &env, testkit::config(), jobs::KNIGHT, &mut Outbox::new())
            .unwrap();
        let c = &state.character;
        assert_eq!(c.job, jobs::KNIGHT);
        assert_eq!((c.job_level, c.job_exp), (1, 0));
        assert_eq!(c.change_level_2nd, 40);
    }

    #[test]
    fn same_or_unknown_jobs_are_refused() {
        let env = testkit::env();
        let mut state = testkit::player(jobs::SWORDMAN, 50, 40);
        let config = testkit::config();
        assert_eq!(
            change_job(&mut state, &env, config, jobs::SWORDMAN, &mut Outbox::new()).unwrap_err(),
            CommandError::Denied(DenyReason::SameJob)
        );
        assert_eq!(
            change_job(&mut state, &env, config, JobId(9_999), &mut Outbox::new()).unwrap_err(),
            CommandError::Denied(DenyReason::JobNotFound)
        );
    }

    #[test]
    fn unusable_gear_and_foreign_skills_are_dropped() {
        let env = testkit::env();
        let config = testkit::config();
        let mut state = testkit::player(jobs::SWORDMAN, 50, 40);
        state.skills.set(skills::BASIC, SkillLevel::Permanent(9));
        state.skills.set(skills::BASH, SkillLevel::Permanent(7));
        let sword = testkit::give(&mut state, InventoryItem::new(items::SWORD, 1));
        equip::equip(&mut state, &env, config, sword, EquipPoints::empty(), &mut Outbox::new())
            .unwrap();

        change_job(&mut state, &env, config, jobs::THIEF, &mut Outbox::new()).unwrap();
        assert_eq!(state.equipped(EquipSlot::HandR), None);
        assert_eq!(state.skills.get(skills::BASH), None);
        assert_eq!(state.character.skill_points, 7);
        assert!(state.skills.is_available(skills::DOUBLE_ATTACK));
    }

    #[test]
    fn crossing_the_upper_boundary_moves_the_stipend() {
        let env = testkit::env();
        let config = testkit::config();
        let mut state = testkit::player(jobs::KNIGHT, 99, 50);
        state.character.status_points = 3;

        change_job(&mut state, &env, config, jobs::LORD_KNIGHT, &mut Outbox::new()).unwrap();
        assert_eq!(state.character.status_points, 3 + config.upper_stipend);
    }

    #[test]
    fn leaving_upper_with_spent_stipend_forces_a_stat_reset() {
        let env = testkit::env();
        let config = testkit::config();
        let mut state = testkit::player(jobs::LORD_KNIGHT, 99, 50);
        let caps = testkit::job(jobs::LORD_KNIGHT).max_stats;
        state.character.stats.set(crate::stats::Stat::Str, 60, &caps);
        state.character.status_points = 10;
        let refund = config.stat_cost.spent_on(60);

        change_job(&mut state, &env, config, jobs::KNIGHT, &mut Outbox::new()).unwrap();
        assert_eq!(state.character.stats.get(crate::stats::Stat::Str), 1);
        assert_eq!(
            state.character.status_points,
            10 + refund - config.upper_stipend
        );
    }
}
