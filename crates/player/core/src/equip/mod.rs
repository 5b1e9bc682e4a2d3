//! Equip and equip-switch state machine.
//!
//! Every slot is either empty or holds an inventory index. The live set is
//! battle-active; the staged set is an alternate loadout that only becomes
//! live through [`swap`]. Bonus registration happens in the recompute pass;
//! this module keeps slots and combos consistent and reports what changed.
//!
//! Slot policy:
//! - an item claims every slot its points name; the requested mask only
//!   picks a side inside an ambiguous pair and must touch the item;
//! - a two-handed weapon claims both hands and displaces whatever held them;
//! - an ambiguous pair (accessories, shadow accessories, dual-wield hands)
//!   resolves to the right-hand side when free, else the left, else the
//!   right-hand occupant is displaced.
pub mod combo;
pub mod validate;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::engine::CommandError;
use crate::env::{PlayerEnv, ScriptEffect, ScriptItem, ScriptPhase, run_hook};
use crate::error::DenyReason;
use crate::notify::{Notification, Outbox};
use crate::state::{
    AMBIGUOUS_PAIRS, EquipPoints, EquipSlot, EquipSlots, InventoryIndex, ItemId, PlayerState,
};

/// Result of an equip-family transition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EquipOutcome {
    /// Slots claimed (equip, swap) or freed (unequip).
    pub slots: EquipPoints,
    /// Side effects requested by unequip hooks; the caller applies them after
    /// the slot transition completes.
    pub effects: Vec<ScriptEffect>,
}

/// Concrete slots an item with `points` claims in `occupied`. `None` when
/// the requested mask misses the item entirely.
///
/// Unambiguous points are always claimed in full; `requested` only picks a
/// side inside an ambiguous pair.
pub fn resolve_slots(
    points: EquipPoints,
    requested: EquipPoints,
    two_handed: bool,
    occupied: &EquipSlots,
) -> Option<EquipPoints> {
    if points.is_empty() || (!requested.is_empty() && !points.intersects(requested)) {
        return None;
    }
    if two_handed {
        return points
            .intersects(EquipPoints::HANDS)
            .then_some(EquipPoints::HANDS);
    }
    let mut claimed = points;
    for (right, left) in AMBIGUOUS_PAIRS {
        let pair = right.points() | left.points();
        if !points.contains(pair) {
            continue;
        }
        let pick = match pair & requested {
            side if side == right.points() => right,
            side if side == left.points() => left,
            _ if occupied.is_free(right) || !occupied.is_free(left) => right,
            _ => left,
        };
        claimed.remove(pair);
        claimed.insert(pick.points());
    }
    Some(claimed)
}

/// Distinct occupants of any slot in `points`.
fn occupants(slots: &EquipSlots, points: EquipPoints) -> Vec<InventoryIndex> {
    let mut out = Vec::new();
    for slot in points.slots() {
        if let Some(index) = slots.get(slot)
            && !out.contains(&index)
        {
            out.push(index);
        }
    }
    out
}

fn provided_ids(state: &PlayerState, index: InventoryIndex) -> Vec<ItemId> {
    state
        .inventory
        .get(index)
        .map(|item| std::iter::once(item.item).chain(item.cards()).collect())
        .unwrap_or_default()
}

/// Removes `index` from the live set: retracts its combos and autobonus
/// activations, runs its unequip hook, then re-detects combos that may
/// still hold without it.
fn detach(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    index: InventoryIndex,
    outbox: &mut Outbox,
    effects: &mut Vec<ScriptEffect>,
) -> EquipPoints {
    let freed = state.loadout.live.clear_index(index);
    if freed.is_empty() {
        return freed;
    }
    let mut candidates = combo::retract(state, freed, outbox);

    for active in state
        .autobonuses
        .remove_where(|active| active.spec.source == Some(index))
    {
        state.timers.cancel(active.timer);
        outbox.push(Notification::AutobonusEnded(active.spec.script));
    }
    outbox.push(Notification::Unequipped {
        index,
        slots: freed,
    });

    if let Some(entry) = state.inventory.get(index).copied()
        && let Ok(item) = env.item(entry.item)
        && let Some(script) = item.unequip_script
        && let Ok(scripts) = env.scripts()
    {
        let hook_item = ScriptItem {
            index,
            id: entry.item,
            refine: entry.refine,
        };
        match run_hook(
            scripts,
            script,
            &state.character,
            Some(hook_item),
            ScriptPhase::Unequip,
        ) {
            Ok(requested) => effects.extend(requested),
            Err(err) => warn!(%index, %err, "unequip hook failed"),
        }
    }

    for id in combo::candidates_of(env, provided_ids(state, index)) {
        if !candidates.contains(&id) {
            candidates.push(id);
        }
    }
    combo::detect(state, env, &candidates, outbox);
    debug!(%index, slots = ?freed, "unequipped");
    freed
}

/// Equips inventory item `index` into the live set.
///
/// # Errors
///
/// `Denied` when the item fails a precondition, `Oracle` when its
/// definition cannot be found.
pub fn equip(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    index: InventoryIndex,
    requested: EquipPoints,
    outbox: &mut Outbox,
) -> Result<EquipOutcome, CommandError> {
    let entry = *state
        .inventory
        .get(index)
        .ok_or(DenyReason::NoSuchItem)?;
    if state.is_equipped(index) {
        return Err(DenyReason::AlreadyEquipped.into());
    }
    let item = env.item(entry.item)?;
    let job = env.job(state.character.job)?;
    let zone = env.zone(state.character.zone);
    validate::check_equippable(&state.character, item, job, zone, config)?;

    let points = validate::effective_points(item, job);
    let target = resolve_slots(points, requested, item.is_two_handed(), &state.loadout.live)
        .ok_or(DenyReason::EquipNoSlot)?;
    if target.intersects(state.statuses.locked_points()) {
        return Err(DenyReason::EquipStatus.into());
    }

    let mut outcome = EquipOutcome::default();
    for other in occupants(&state.loadout.live, target) {
        detach(state, env, other, outbox, &mut outcome.effects);
    }
    let unstaged = state.loadout.staged.clear_index(index);
    if !unstaged.is_empty() {
        outbox.push(Notification::Unstaged {
            index,
            slots: unstaged,
        });
    }
    for slot in target.slots() {
        state.loadout.live.set(slot, Some(index));
    }
    outbox.push(Notification::Equipped {
        index,
        slots: target,
    });

    let candidates = combo::candidates_of(env, provided_ids(state, index));
    combo::detect(state, env, &candidates, outbox);
    debug!(%index, item = %entry.item, slots = ?target, "equipped");

    outcome.slots = target;
    Ok(outcome)
}

/// Clears `slot` of the live set. A no-op when the slot is empty or, unless
/// `force` is set, when a status or the zone locks the item.
pub fn unequip(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    slot: EquipSlot,
    force: bool,
    outbox: &mut Outbox,
) -> EquipOutcome {
    let mut outcome = EquipOutcome::default();
    let Some(index) = state.loadout.live.get(slot) else {
        return outcome;
    };
    if !force {
        let held = state.loadout.live.points_of(index);
        let privileged = config.is_privileged(state.character.group_level);
        if held.intersects(state.statuses.locked_points())
            || validate::zone_locks_equipment(env.zone(state.character.zone), privileged)
        {
            debug!(%index, ?slot, "unequip blocked");
            return outcome;
        }
    }
    outcome.slots = detach(state, env, index, outbox, &mut outcome.effects);
    outcome
}

/// Stages `index` into the alternate loadout. Validated like [`equip`] but
/// registers nothing.
///
/// # Errors
///
/// Same as [`equip`].
pub fn equip_switch(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    index: InventoryIndex,
    requested: EquipPoints,
    outbox: &mut Outbox,
) -> Result<EquipPoints, CommandError> {
    let entry = *state
        .inventory
        .get(index)
        .ok_or(DenyReason::NoSuchItem)?;
    if state.is_equipped(index) || !state.loadout.staged.points_of(index).is_empty() {
        return Err(DenyReason::AlreadyEquipped.into());
    }
    let item = env.item(entry.item)?;
    let job = env.job(state.character.job)?;
    validate::check_equippable(
        &state.character,
        item,
        job,
        env.zone(state.character.zone),
        config,
    )?;
    let points = validate::effective_points(item, job);
    let target = resolve_slots(
        points,
        requested,
        item.is_two_handed(),
        &state.loadout.staged,
    )
    .ok_or(DenyReason::EquipNoSlot)?;

    for other in occupants(&state.loadout.staged, target) {
        let freed = state.loadout.staged.clear_index(other);
        outbox.push(Notification::Unstaged {
            index: other,
            slots: freed,
        });
    }
    for slot in target.slots() {
        state.loadout.staged.set(slot, Some(index));
    }
    outbox.push(Notification::Staged {
        index,
        slots: target,
    });
    debug!(%index, slots = ?target, "staged");
    Ok(target)
}

/// Clears `slot` of the staged set; no-op when empty.
pub fn unequip_switch(state: &mut PlayerState, slot: EquipSlot, outbox: &mut Outbox) -> EquipPoints {
    let Some(index) = state.loadout.staged.get(slot) else {
        return EquipPoints::empty();
    };
    let freed = state.loadout.staged.clear_index(index);
    outbox.push(Notification::Unstaged {
        index,
        slots: freed,
    });
    freed
}

/// Makes the staged items under `mask` live, moving displaced live items
/// into the staged set where their slots are free.
///
/// Every staged item is validated before anything moves; one failure
/// declines the whole swap.
///
/// # Errors
///
/// `Denied(StagedMismatch)` when a staged item is no longer equippable,
/// `Denied(EquipStatus)` when the affected slots are locked.
pub fn swap(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    mask: EquipPoints,
    outbox: &mut Outbox,
) -> Result<EquipOutcome, CommandError> {
    if state.character.is_dead() {
        return Err(DenyReason::Dead.into());
    }
    let incoming = occupants(&state.loadout.staged, mask);
    if incoming.is_empty() {
        return Ok(EquipOutcome::default());
    }

    let covered = incoming.iter().fold(mask, |acc, &index| {
        acc | state.loadout.staged.points_of(index)
    });
    let privileged = config.is_privileged(state.character.group_level);
    let zone = env.zone(state.character.zone);
    if covered.intersects(state.statuses.locked_points())
        || validate::zone_locks_equipment(zone, privileged)
    {
        return Err(DenyReason::EquipStatus.into());
    }

    let job = env.job(state.character.job)?;
    for &index in &incoming {
        let entry = state
            .inventory
            .get(index)
            .ok_or(DenyReason::StagedMismatch)?;
        let item = env.item(entry.item)?;
        validate::check_equippable(&state.character, item, job, zone, config)
            .map_err(|_| DenyReason::StagedMismatch)?;
        let held = state.loadout.staged.points_of(index);
        if !validate::effective_points(item, job).contains(held) {
            return Err(DenyReason::StagedMismatch.into());
        }
    }

    let outgoing = occupants(&state.loadout.live, covered);
    let mut next = state.loadout;
    let mut placements = Vec::with_capacity(incoming.len());
    for &index in &incoming {
        placements.push((index, next.staged.clear_index(index)));
    }
    let mut restaged = Vec::new();
    for &index in &outgoing {
        let held = next.live.clear_index(index);
        if held.slots().all(|slot| next.staged.is_free(slot)) {
            for slot in held.slots() {
                next.staged.set(slot, Some(index));
            }
            restaged.push((index, held));
        }
    }
    for &(index, held) in &placements {
        for slot in held.slots() {
            next.live.set(slot, Some(index));
        }
    }

    let mut outcome = EquipOutcome::default();
    for &index in &outgoing {
        detach(state, env, index, outbox, &mut outcome.effects);
    }
    state.loadout = next;
    for (index, held) in restaged {
        outbox.push(Notification::Staged { index, slots: held });
    }
    let mut candidates = Vec::new();
    for (index, held) in placements {
        outbox.push(Notification::Equipped { index, slots: held });
        outcome.slots |= held;
        for id in combo::candidates_of(env, provided_ids(state, index)) {
            if !candidates.contains(&id) {
                candidates.push(id);
            }
        }
    }
    combo::detect(state, env, &candidates, outbox);
    debug!(slots = ?outcome.slots, "loadouts swapped");
    Ok(outcome)
}

/// Force-unequips every live item the current job can no longer wear and
/// unstages the staged ones.
///
/// # Errors
///
/// `Oracle` when the current job is unknown.
pub fn unequip_unusable(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    outbox: &mut Outbox,
) -> Result<Vec<ScriptEffect>, CommandError> {
    let job = env.job(state.character.job)?;
    let unusable = |state: &PlayerState, slots: &EquipSlots| -> Vec<InventoryIndex> {
        slots
            .distinct()
            .into_iter()
            .filter(|(_, index)| {
                let Some(entry) = state.inventory.get(*index) else {
                    return true;
                };
                let Ok(item) = env.item(entry.item) else {
                    return true;
                };
                validate::check_wearer(&state.character, item, job).is_err()
                    || !validate::effective_points(item, job).contains(slots.points_of(*index))
            })
            .map(|(_, index)| index)
            .collect()
    };

    let mut effects = Vec::new();
    for index in unusable(state, &state.loadout.live) {
        detach(state, env, index, outbox, &mut effects);
    }
    for index in unusable(state, &state.loadout.staged) {
        let freed = state.loadout.staged.clear_index(index);
        outbox.push(Notification::Unstaged {
            index,
            slots: freed,
        });
    }
    Ok(effects)
}

/// Takes `index` out of both loadouts, e.g. before the item leaves the
/// inventory.
pub fn release(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    index: InventoryIndex,
    outbox: &mut Outbox,
) -> Vec<ScriptEffect> {
    let mut effects = Vec::new();
    detach(state, env, index, outbox, &mut effects);
    let freed = state.loadout.staged.clear_index(index);
    if !freed.is_empty() {
        outbox.push(Notification::Unstaged {
            index,
            slots: freed,
        });
    }
    effects
}

/// Resets slots that reference a missing item or an item that cannot occupy
/// them. Returns the live points that were cleared.
pub fn repair_slots(state: &mut PlayerState, env: &PlayerEnv<'_>) -> EquipPoints {
    let job = env.job(state.character.job).ok();
    let mut cleared_live = EquipPoints::empty();
    let mut repairs = 0;

    for staged in [false, true] {
        let slots = if staged {
            state.loadout.staged
        } else {
            state.loadout.live
        };
        for (slot, index) in slots.iter() {
            let valid = state
                .inventory
                .get(index)
                .and_then(|entry| env.item(entry.item).ok())
                .is_some_and(|item| {
                    let points = match job {
                        Some(job) => validate::effective_points(item, job),
                        None => item.equip_points,
                    };
                    points.contains(slot.points())
                });
            if valid {
                continue;
            }
            warn!(%index, ?slot, staged, "inconsistent equip slot reset");
            repairs += 1;
            if staged {
                state.loadout.staged.set(slot, None);
            } else {
                state.loadout.live.set(slot, None);
                cleared_live |= slot.points();
            }
        }
    }
    state.diagnostics.repairs += repairs;
    cleared_live
}
