//! Experience intake and the level-up loop.
//!
//! ```text
//! raw amount ─▶ race/class add ─▶ boost status ─▶ level gap ─▶ VIP ─▶ gain cap
//!            └────────────── RAW skips every modifier ─────────────┘
//! ```
//!
//! A level is consumed one threshold at a time. Without multi-level-up the
//! carry after each level is capped at that level's threshold minus one. At
//! the job's max level experience is pinned at `threshold(max) - 1`.

use bitflags::bitflags;
use tracing::debug;

use crate::config::EngineConfig;
use crate::engine::CommandError;
use crate::env::{JobOracle, PlayerEnv};
use crate::notify::{Notification, Outbox};
use crate::state::{JobId, PlayerState, StatusKind};
use crate::stats::{MonsterClass, Race};

bitflags! {
    /// Modifiers for one experience gain.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ExpFlags: u8 {
        /// Skip every percentage modifier.
        const RAW = 1 << 0;
        /// Quest reward; never subject to the level-gap penalty.
        const QUEST = 1 << 1;
    }
}

/// Where experience comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExpSource {
    Monster {
        race: Race,
        class: MonsterClass,
        level: u16,
    },
    Quest,
    Script,
}

/// Base or job experience.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Track {
    Base,
    Job,
}

impl Track {
    fn threshold<J: JobOracle + ?Sized>(self, jobs: &J, job: JobId, level: u16) -> Option<u64> {
        match self {
            Track::Base => jobs.base_exp_threshold(job, level),
            Track::Job => jobs.job_exp_threshold(job, level),
        }
    }

    fn boost(self) -> StatusKind {
        match self {
            Track::Base => StatusKind::ExpBoost,
            Track::Job => StatusKind::JobExpBoost,
        }
    }

    fn counters(self, state: &PlayerState) -> (u16, u64) {
        let c = &state.character;
        match self {
            Track::Base => (c.base_level, c.base_exp),
            Track::Job => (c.job_level, c.job_exp),
        }
    }

    fn store(self, state: &mut PlayerState, level: u16, exp: u64) {
        let c = &mut state.character;
        match self {
            Track::Base => (c.base_level, c.base_exp) = (level, exp),
            Track::Job => (c.job_level, c.job_exp) = (level, exp),
        }
    }

    fn exp_notification(self, exp: u64) -> Notification {
        match self {
            Track::Base => Notification::BaseExp(exp),
            Track::Job => Notification::JobExp(exp),
        }
    }
}

/// One experience award as requested by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpReward {
    pub base: u64,
    pub job: u64,
    pub source: ExpSource,
    pub flags: ExpFlags,
}

impl ExpReward {
    /// Unmodified experience from a script.
    pub fn raw(base: u64, job: u64) -> Self {
        Self {
            base,
            job,
            source: ExpSource::Script,
            flags: ExpFlags::RAW,
        }
    }
}

/// What one gain actually did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpGain {
    /// Experience credited after modifiers and caps.
    pub base: u64,
    pub job: u64,
    pub base_levels: u16,
    pub job_levels: u16,
}

fn scale(value: u128, percent: i64) -> u128 {
    value * u128::try_from(percent.max(0)).unwrap_or(0) / 100
}

/// Applies every percentage modifier to `amount` on `track`.
pub fn adjusted(
    state: &PlayerState,
    config: &EngineConfig,
    amount: u64,
    track: Track,
    source: ExpSource,
    flags: ExpFlags,
) -> u64 {
    if flags.contains(ExpFlags::RAW) || amount == 0 {
        return amount;
    }
    let mut value = u128::from(amount);

    if let ExpSource::Monster { race, class, .. } = source {
        let add = state.bonuses.exp_add_race.get(race) + state.bonuses.exp_add_class.get(class);
        value = scale(value, 100 + i64::from(add));
    }
    value = scale(value, 100 + i64::from(state.statuses.value(track.boost())));
    if let ExpSource::Monster { level, .. } = source
        && !flags.contains(ExpFlags::QUEST)
    {
        let diff = i32::from(level) - i32::from(state.character.base_level);
        value = scale(value, i64::from(config.level_gap_rate(diff)));
    }
    if let Some(vip) = config.vip(state.character.vip_tier) {
        value = scale(value, 100 + i64::from(vip.exp_bonus));
    }
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Status points awarded on reaching base `level`.
pub fn status_award<J: JobOracle + ?Sized>(jobs: &J, job: JobId, level: u16) -> u32 {
    jobs.status_point_award(job, level)
        .unwrap_or_else(|| (u32::from(level) + 14) / 5)
}

/// Credits `amount` on `track`, levelling up as far as policy allows.
/// Returns the experience credited and the levels gained.
fn credit(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    track: Track,
    amount: u64,
    outbox: &mut Outbox,
) -> Result<(u64, u16), CommandError> {
    let jobs = env.jobs()?;
    let def = env.job(state.character.job)?;
    let job = def.id;
    let max = match track {
        Track::Base => def.max_base_level,
        Track::Job => def.max_job_level,
    };
    let (mut level, before) = track.counters(state);
    let mut gained = amount;

    if config.max_exp_gain_rate > 0
        && let Some(next) = track.threshold(jobs, job, level)
    {
        let cap = u128::from(next) * u128::from(config.max_exp_gain_rate) / 1000;
        gained = gained.min(u64::try_from(cap).unwrap_or(u64::MAX));
    }

    let mut exp = before.saturating_add(gained);
    let mut consumed = 0u64;
    let mut levels = 0u16;
    while level < max {
        let Some(next) = track.threshold(jobs, job, level) else {
            break;
        };
        if next == 0 || exp < next {
            break;
        }
        exp -= next;
        consumed = consumed.saturating_add(next);
        if !config.multi_level_up && exp > next - 1 {
            exp = next - 1;
        }
        level += 1;
        levels += 1;
        match track {
            Track::Base => {
                state.character.status_points += status_award(jobs, job, level);
                outbox.push(Notification::BaseLevelUp { level });
            }
            Track::Job => {
                state.character.skill_points += 1;
                outbox.push(Notification::JobLevelUp { level });
            }
        }
    }
    if level >= max {
        // Without a row for the last level a gain never moves the counter.
        let pin = match track.threshold(jobs, job, max) {
            Some(threshold) => threshold.saturating_sub(1),
            None if levels == 0 => before,
            None => exp,
        };
        exp = exp.min(pin);
    }

    track.store(state, level, exp);
    if exp != before || levels > 0 {
        outbox.push(track.exp_notification(exp));
    }
    if levels > 0 {
        match track {
            Track::Base => outbox.push(Notification::StatusPoints(state.character.status_points)),
            Track::Job => outbox.push(Notification::SkillPoints(state.character.skill_points)),
        }
        debug!(?track, level, levels, "level up");
    }
    Ok(((consumed + exp).saturating_sub(before), levels))
}

/// Adds the base and job experience of `reward`.
///
/// # Errors
///
/// `Oracle` when the character's job or experience tables are missing.
pub fn gain_experience(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    reward: ExpReward,
    outbox: &mut Outbox,
) -> Result<ExpGain, CommandError> {
    let ExpReward {
        base,
        job,
        source,
        flags,
    } = reward;
    let base = adjusted(state, config, base, Track::Base, source, flags);
    let job = adjusted(state, config, job, Track::Job, source, flags);

    let (base, base_levels) = credit(state, env, config, Track::Base, base, outbox)?;
    let (job, job_levels) = credit(state, env, config, Track::Job, job, outbox)?;
    Ok(ExpGain {
        base,
        job,
        base_levels,
        job_levels,
    })
}

/// Removes experience, flooring each counter at zero. Levels never drop.
/// Returns what was actually removed.
pub fn lose_experience(
    state: &mut PlayerState,
    base: u64,
    job: u64,
    outbox: &mut Outbox,
) -> (u64, u64) {
    let c = &mut state.character;
    let lost_base = base.min(c.base_exp);
    let lost_job = job.min(c.job_exp);
    c.base_exp -= lost_base;
    c.job_exp -= lost_job;
    if lost_base > 0 {
        outbox.push(Notification::BaseExp(c.base_exp));
    }
    if lost_job > 0 {
        outbox.push(Notification::JobExp(c.job_exp));
    }
    (lost_base, lost_job)
}
