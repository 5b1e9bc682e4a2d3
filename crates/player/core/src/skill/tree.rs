//! Skill tree resolution.
//!
//! ```text
//! normalize_job   true job ──(skill points spent)──▶ lookup job
//! resolve         lookup tree ──(fixed point)──▶ available set
//!                 rank track / privilege ──▶ temporary levels
//! ```
//!
//! Resolution only decides which tree entries are offered and which
//! temporary levels apply. Permanent levels change through learning,
//! resetting and pruning.

use std::collections::BTreeSet;

use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::engine::CommandError;
use crate::env::{JobDefinition, JobTier, PlayerEnv, SkillFlags, SkillTreeEntry};
use crate::notify::Outbox;
use crate::state::{JobId, PlayerState, SkillId, StateFlags, TemporarySource};

/// Parent-chain walks stop after this many hops.
const MAX_LINEAGE: usize = 8;

/// Closest ancestor of `job` (itself included) at `tier`.
fn ancestor_at<'a>(
    env: &PlayerEnv<'a>,
    job: &'a JobDefinition,
    tier: JobTier,
) -> Option<&'a JobDefinition> {
    let mut current = job;
    for _ in 0..MAX_LINEAGE {
        if current.tier == tier {
            return Some(current);
        }
        current = env.job(current.parent?).ok()?;
    }
    None
}

/// Job whose tree is consulted for `state`.
///
/// With the skill-up limit on, a character that has not spent enough points
/// in its earlier classes is treated as that earlier class. The stored job
/// is untouched.
///
/// # Errors
///
/// `Oracle` when the character's job is unknown.
pub fn normalize_job(
    state: &PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
) -> Result<JobId, CommandError> {
    let character = &state.character;
    let job = env.job(character.job)?;
    if !config.skillup_limit || config.is_privileged(character.group_level) {
        return Ok(job.id);
    }

    let spent = state.skills.spent_points();
    let novice_skills = ancestor_at(env, job, JobTier::Novice)
        .map_or(0, |novice| u32::from(novice.max_job_level.saturating_sub(1)));
    let second = u32::from(character.change_level_2nd.saturating_sub(1));
    let third = u32::from(character.change_level_3rd.saturating_sub(1));

    let lowered = if job.tier > JobTier::Novice && spent < novice_skills {
        ancestor_at(env, job, JobTier::Novice)
    } else if job.tier >= JobTier::Second
        && character.change_level_2nd > 0
        && spent < novice_skills + second
    {
        ancestor_at(env, job, JobTier::First)
    } else if job.tier >= JobTier::Third
        && character.change_level_3rd > 0
        && spent < novice_skills + second + third
    {
        ancestor_at(env, job, JobTier::Second)
    } else {
        None
    };

    Ok(lowered.map_or(job.id, |lower| {
        trace!(job = %job.id, lookup = %lower.id, spent, "skill tree normalized");
        lower.id
    }))
}

fn meets_levels(entry: &SkillTreeEntry, base_level: u16, job_level: u16) -> bool {
    base_level >= entry.base_level && job_level >= entry.job_level
}

/// Recomputes the available set and the rank-track / privilege temporaries.
///
/// Running it twice without an intervening change yields the same record.
///
/// # Errors
///
/// `Oracle` when the job or skill oracle is missing.
pub fn resolve(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    outbox: &mut Outbox,
) -> Result<(), CommandError> {
    let before = state.skills.clone();
    let oracle = env.skills()?;
    state.skills.clear_temporary(TemporarySource::RankTrack);
    state.skills.clear_temporary(TemporarySource::Privilege);

    if config.is_privileged(state.character.group_level) {
        let mut available = BTreeSet::new();
        for def in oracle.all_skills() {
            if def.flags.intersects(SkillFlags::NPC | SkillFlags::GUILD) {
                continue;
            }
            state
                .skills
                .apply_temporary(def.id, def.max_level, TemporarySource::Privilege);
            available.insert(def.id);
        }
        state.skills.set_available(available);
        super::notify_changes(&before, &state.skills, outbox);
        return Ok(());
    }

    let lookup = normalize_job(state, env, config)?;
    let tree = oracle.tree(lookup);
    let own_tree = (lookup != state.character.job).then(|| oracle.tree(state.character.job));
    let character = &state.character;
    let links: Vec<JobId> = state.statuses.soul_links().collect();

    let mut available: BTreeSet<_> = BTreeSet::new();
    let mut passes = 0;
    loop {
        passes += 1;
        let mut granted = false;
        for entry in tree {
            if available.contains(&entry.skill) {
                continue;
            }
            let Some(def) = oracle.skill(entry.skill) else {
                warn!(skill = %entry.skill, job = %lookup, "tree references unknown skill");
                continue;
            };
            if def.flags.contains(SkillFlags::WEDDING)
                || (def.is_quest() && !config.quest_skill_learn)
            {
                continue;
            }
            if entry.linked_to.is_some_and(|job| !links.contains(&job)) {
                continue;
            }
            let levels_ok = meets_levels(entry, character.base_level, character.job_level)
                || own_tree
                    .and_then(|own| own.iter().find(|e| e.skill == entry.skill))
                    .is_some_and(|own| {
                        meets_levels(own, character.base_level, character.job_level)
                    });
            if !levels_ok {
                continue;
            }
            let prerequisites_ok = entry.prerequisites.iter().all(|req| {
                let in_tree = tree.iter().any(|e| e.skill == req.skill);
                state.skills.known_level(req.skill) >= req.level
                    && (!in_tree || available.contains(&req.skill))
            });
            if !prerequisites_ok {
                continue;
            }
            available.insert(entry.skill);
            granted = true;
        }
        if !granted {
            break;
        }
        if passes >= EngineConfig::MAX_RESOLVE_PASSES {
            warn!(job = %lookup, passes, "skill tree did not settle, stopping");
            break;
        }
    }
    trace!(job = %lookup, passes, offered = available.len(), "skill tree resolved");
    state.skills.set_available(available);

    grant_rank_track(state, env, config)?;
    super::notify_changes(&before, &state.skills, outbox);
    Ok(())
}

/// Grants the whole rank-track tree as temporary levels once a ranked
/// character has spent every skill point.
fn grant_rank_track(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
) -> Result<(), CommandError> {
    let character = &state.character;
    let Some(track) = env.job(character.job)?.rank_track else {
        return Ok(());
    };
    if !character.flags.contains(StateFlags::RANKED)
        || character.base_level < config.ranker_min_level
        || character.skill_points > 0
    {
        return Ok(());
    }
    let tree = env.skills()?.tree(track);
    for entry in tree {
        state
            .skills
            .apply_temporary(entry.skill, entry.max_level, TemporarySource::RankTrack);
    }
    debug!(job = %track, skills = tree.len(), "rank-track tree granted");
    Ok(())
}

/// Whether `skill` sits in the tree of `job`.
pub fn in_tree(env: &PlayerEnv<'_>, job: JobId, skill: SkillId) -> bool {
    env.skills()
        .is_ok_and(|oracle| oracle.tree(job).iter().any(|entry| entry.skill == skill))
}

/// Tree entry for `skill` in the lookup tree of `state`, falling back to the
/// character's own tree.
pub fn entry_for<'a>(
    state: &PlayerState,
    env: &PlayerEnv<'a>,
    config: &EngineConfig,
    skill: SkillId,
) -> Result<Option<&'a SkillTreeEntry>, CommandError> {
    let oracle = env.skills()?;
    let lookup = normalize_job(state, env, config)?;
    Ok(oracle
        .tree(lookup)
        .iter()
        .chain(oracle.tree(state.character.job))
        .find(|entry| entry.skill == skill))
}
