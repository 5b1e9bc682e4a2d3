//! Skill record mutations: learning, resets, pruning on job change,
//! plagiarism and item-granted levels.
pub mod tree;

pub use tree::{normalize_job, resolve};

use tracing::debug;

use crate::config::EngineConfig;
use crate::engine::CommandError;
use crate::env::{PlayerEnv, SkillFlags};
use crate::error::DenyReason;
use crate::notify::{Notification, Outbox};
use crate::state::{JobId, PlayerState, SkillId, SkillLevel, SkillRecord, TemporarySource};

/// Emits one notification per skill whose level or origin differs, plus a
/// tree notification when the offered set changed.
pub(crate) fn notify_changes(before: &SkillRecord, after: &SkillRecord, outbox: &mut Outbox) {
    for (skill, level) in after.iter() {
        if before.get(skill) != Some(level) {
            outbox.push(Notification::SkillChanged { skill, level });
        }
    }
    for (skill, _) in before.iter() {
        if after.get(skill).is_none() {
            outbox.push(Notification::SkillRemoved(skill));
        }
    }
    if !before.available().eq(after.available()) {
        outbox.push(Notification::SkillTreeChanged);
    }
}

/// Spends one skill point on `skill`.
///
/// # Errors
///
/// `InsufficientSkillPoints` without a point to spend, `SkillNotLearnable`
/// when the tree does not offer the skill or its level is not permanent,
/// `SkillAtMax` at the tree's maximum.
pub fn learn_skill(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    skill: SkillId,
    outbox: &mut Outbox,
) -> Result<SkillLevel, CommandError> {
    if state.character.skill_points == 0 {
        return Err(DenyReason::InsufficientSkillPoints.into());
    }
    if !state.skills.is_available(skill) {
        return Err(DenyReason::SkillNotLearnable.into());
    }
    let max = match tree::entry_for(state, env, config, skill)? {
        Some(entry) => entry.max_level,
        None => env.skill(skill)?.max_level,
    };

    let next = match state.skills.get(skill) {
        None => SkillLevel::Permanent(1),
        Some(SkillLevel::Permanent(level)) if level < max => SkillLevel::Permanent(level + 1),
        Some(SkillLevel::OverriddenFrom {
            original,
            current,
            source,
        }) if original < max => SkillLevel::OverriddenFrom {
            original: original + 1,
            current: current.max(original + 1),
            source,
        },
        Some(SkillLevel::Permanent(_) | SkillLevel::OverriddenFrom { .. }) => {
            return Err(DenyReason::SkillAtMax.into());
        }
        Some(_) => return Err(DenyReason::SkillNotLearnable.into()),
    };

    state.skills.set(skill, next);
    state.character.skill_points -= 1;
    outbox.push(Notification::SkillChanged { skill, level: next });
    outbox.push(Notification::SkillPoints(state.character.skill_points));
    debug!(%skill, level = next.known_level(), "skill learned");
    Ok(next)
}

/// Refunds every permanent level except quest skills. Returns the points
/// refunded.
pub fn reset_skills(state: &mut PlayerState, env: &PlayerEnv<'_>, outbox: &mut Outbox) -> u32 {
    let before = state.skills.clone();
    let mut refunded = 0;
    let learned: Vec<(SkillId, SkillLevel)> = state
        .skills
        .iter()
        .filter(|(_, level)| level.spent_level() > 0)
        .collect();

    for (skill, level) in learned {
        if env.skill(skill).is_ok_and(|def| def.is_quest()) {
            continue;
        }
        refunded += u32::from(level.spent_level());
        match level {
            SkillLevel::OverriddenFrom {
                current, source, ..
            } => state.skills.set(
                skill,
                SkillLevel::Temporary {
                    level: current,
                    source,
                },
            ),
            _ => {
                state.skills.remove(skill);
            }
        }
    }

    if refunded > 0 {
        state.character.skill_points += refunded;
        notify_changes(&before, &state.skills, outbox);
        outbox.push(Notification::SkillPoints(state.character.skill_points));
        debug!(refunded, "skills reset");
    }
    refunded
}

/// Removes permanent levels of skills that are not in `job`'s tree, refunding
/// their points. Quest, granted and plagiarized skills stay.
pub fn prune_for_job(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    job: JobId,
    outbox: &mut Outbox,
) -> u32 {
    let before = state.skills.clone();
    let abandoned: Vec<(SkillId, SkillLevel)> = state
        .skills
        .iter()
        .filter(|(skill, level)| level.spent_level() > 0 && !tree::in_tree(env, job, *skill))
        .filter(|(skill, _)| !env.skill(*skill).is_ok_and(|def| def.is_quest()))
        .collect();

    let mut refunded = 0;
    for (skill, level) in abandoned {
        refunded += u32::from(level.spent_level());
        state.skills.remove(skill);
    }
    if refunded > 0 {
        state.character.skill_points += refunded;
        notify_changes(&before, &state.skills, outbox);
        outbox.push(Notification::SkillPoints(state.character.skill_points));
        debug!(%job, refunded, "skills outside the new tree pruned");
    }
    refunded
}

/// Stores a copy of another player's skill, replacing the previous copy.
///
/// # Errors
///
/// `SkillNotLearnable` when the character already knows the skill or the
/// skill is not a player skill.
pub fn copy_skill(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    skill: SkillId,
    level: u8,
    outbox: &mut Outbox,
) -> Result<SkillLevel, CommandError> {
    let def = env.skill(skill)?;
    if def
        .flags
        .intersects(SkillFlags::NPC | SkillFlags::GUILD | SkillFlags::QUEST | SkillFlags::WEDDING)
        || state.skills.get(skill).is_some()
        || level == 0
    {
        return Err(DenyReason::SkillNotLearnable.into());
    }
    if let Some((previous, _)) = state.skills.plagiarized() {
        state.skills.remove(previous);
        outbox.push(Notification::SkillRemoved(previous));
    }
    let copied = SkillLevel::Plagiarized(level.min(def.max_level));
    state.skills.set(skill, copied);
    outbox.push(Notification::SkillChanged {
        skill,
        level: copied,
    });
    debug!(%skill, level = copied.level(), "skill copied");
    Ok(copied)
}

/// Grants `skill` outright, ignoring the tree (quest rewards and the like).
///
/// # Errors
///
/// `Oracle` for unknown skills.
pub fn grant_skill(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    skill: SkillId,
    level: u8,
    outbox: &mut Outbox,
) -> Result<SkillLevel, CommandError> {
    let def = env.skill(skill)?;
    let level = level.clamp(1, def.max_level.max(1));
    let granted = match state.skills.get(skill) {
        Some(existing) if existing.known_level() >= level => return Ok(existing),
        Some(SkillLevel::Permanent(original)) | Some(SkillLevel::OverriddenFrom { original, .. }) => {
            // points already spent stay refundable
            state.character.skill_points += u32::from(original);
            SkillLevel::Granted(level)
        }
        _ => SkillLevel::Granted(level),
    };
    state.skills.set(skill, granted);
    outbox.push(Notification::SkillChanged {
        skill,
        level: granted,
    });
    Ok(granted)
}

/// Replaces item-granted temporary levels with the grants in the current
/// bonus table.
pub fn refresh_item_skills(state: &mut PlayerState) {
    state.skills.clear_temporary(TemporarySource::Item);
    let grants: Vec<_> = state.bonuses.granted_skills.iter().copied().collect();
    for grant in grants {
        state
            .skills
            .apply_temporary(grant.skill, grant.level, TemporarySource::Item);
    }
}
