//! Death penalty and respawn.

use tracing::debug;

use crate::config::EngineConfig;
use crate::engine::CommandError;
use crate::env::{PlayerEnv, ZoneFlags};
use crate::error::DenyReason;
use crate::notify::{Notification, Outbox};
use crate::state::{PlayerState, StateFlags};

use super::exp::lose_experience;

/// Experience removed on death, before flooring.
pub fn death_penalty(
    state: &PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
) -> Result<(u64, u64), CommandError> {
    let character = &state.character;
    if env.job(character.job)?.is_novice()
        || env
            .zone(character.zone)
            .is_some_and(|zone| zone.flags.contains(ZoneFlags::NO_EXP_PENALTY))
    {
        return Ok((0, 0));
    }
    let vip_rate = config
        .vip(character.vip_tier)
        .map_or(100, |vip| u128::from(vip.penalty_rate));
    let penalty = |exp: u64, rate: u32| {
        let lost = u128::from(exp) * u128::from(rate) / 10_000 * vip_rate / 100;
        u64::try_from(lost).unwrap_or(u64::MAX)
    };
    Ok((
        penalty(character.base_exp, config.death_penalty_base),
        penalty(character.job_exp, config.death_penalty_job),
    ))
}

/// Marks the character dead and applies the death penalty.
///
/// # Errors
///
/// `Dead` when already dead.
pub fn die(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    outbox: &mut Outbox,
) -> Result<(u64, u64), CommandError> {
    if state.character.is_dead() {
        return Err(DenyReason::Dead.into());
    }
    let (base, job) = death_penalty(state, env, config)?;
    state.character.flags.insert(StateFlags::DEAD);
    state.character.flags.remove(StateFlags::SITTING);
    state.character.hp = 0;
    let lost = lose_experience(state, base, job, outbox);
    outbox.push(Notification::Died);
    debug!(base = lost.0, job = lost.1, "character died");
    Ok(lost)
}

/// Revives a dead character with `hp_percent` of its max HP and SP (at
/// least 1 HP). A no-op for the living.
pub fn respawn(state: &mut PlayerState, hp_percent: u8, outbox: &mut Outbox) -> bool {
    if !state.character.is_dead() {
        return false;
    }
    let percent = u64::from(hp_percent.min(100));
    let share = |max: u32| u32::try_from(u64::from(max) * percent / 100).unwrap_or(max);
    let battle = state.battle;
    let character = &mut state.character;
    character.flags.remove(StateFlags::DEAD);
    character.hp = share(battle.max_hp).max(1);
    character.sp = character.sp.max(share(battle.max_sp)).min(battle.max_sp);
    outbox.push(Notification::Respawned);
    outbox.push(Notification::Hp {
        hp: character.hp,
        max: battle.max_hp,
    });
    outbox.push(Notification::Sp {
        sp: character.sp,
        max: battle.max_sp,
    });
    debug!(hp = character.hp, "character respawned");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{self, jobs, zones};

    #[test]
    fn penalty_is_a_share_of_current_experience() {
        let env = testkit::env();
        let mut state = testkit::player(jobs::SWORDMAN, 50, 20);
        state.character.base_exp = 4_000;
        state.character.job_exp = 900;

        let lost = die(&mut state, &env, testkit::config(), &mut Outbox::new()).unwrap();
        assert_eq!(lost, (40, 9));
        assert_eq!(state.character.base_exp, 3_960);
        assert!(state.character.is_dead());

        let err = die(&mut state, &env, testkit::config(), &mut Outbox::new()).unwrap_err();
        assert_eq!(err, CommandError::Denied(DenyReason::Dead));
    }

    #[test]
    fn vip_tiers_reduce_the_penalty() {
        let env = testkit::env();
        let mut state = testkit::player(jobs::SWORDMAN, 50, 20);
        state.character.base_exp = 4_000;
        state.character.vip_tier = 1;
        assert_eq!(
            death_penalty(&state, &env, testkit::config()).unwrap(),
            (20, 0)
        );
        state.character.vip_tier = 2;
        assert_eq!(
            death_penalty(&state, &env, testkit::config()).unwrap(),
            (0, 0)
        );
    }

    #[test]
    fn novices_and_safe_zones_lose_nothing() {
        let env = testkit::env();
        let mut novice = testkit::player(jobs::NOVICE, 10, 5);
        novice.character.base_exp = 500;
        assert_eq!(
            death_penalty(&novice, &env, testkit::config()).unwrap(),
            (0, 0)
        );

        let mut swordman = testkit::player(jobs::SWORDMAN, 50, 20);
        swordman.character.base_exp = 4_000;
        swordman.character.zone = zones::ARENA;
        assert_eq!(
            death_penalty(&swordman, &env, testkit::config()).unwrap(),
            (0, 0)
        );
    }

    #[test]
    fn respawn_restores_a_share_of_hp() {
        let env = testkit::env();
        let mut state = testkit::player(jobs::SWORDMAN, 50, 20);
        die(&mut state, &env, testkit::config(), &mut Outbox::new()).unwrap();
        assert!(respawn(&mut state, 50, &mut Outbox::new()));
        assert!(!state.character.is_dead());
        assert_eq!(state.character.hp, state.battle.max_hp / 2);
        assert!(!respawn(&mut state, 50, &mut Outbox::new()));
    }
}
