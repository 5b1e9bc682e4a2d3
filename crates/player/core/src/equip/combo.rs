//! Combo detection.
//!
//! A combo is satisfied when every member id is provided by a different
//! equipped item, counting the item itself and the cards inserted into it.
//! Members are matched to providers with augmenting paths, so duplicate
//! members (two of the same card) need two distinct items.

use tracing::{debug, warn};

use crate::env::{ComboDefinition, PlayerEnv};
use crate::notify::{Notification, Outbox};
use crate::state::{ActiveCombo, ComboId, EquipPoints, ItemId, PlayerState};

/// One equipped item and every id it provides.
struct Provider {
    points: EquipPoints,
    ids: Vec<ItemId>,
}

fn providers(state: &PlayerState) -> Vec<Provider> {
    state
        .loadout
        .live
        .distinct()
        .into_iter()
        .filter(|(slot, _)| !slot.is_costume())
        .filter_map(|(_, index)| {
            let item = state.inventory.get(index)?;
            let mut ids = vec![item.item];
            ids.extend(item.cards());
            Some(Provider {
                points: state.loadout.live.points_of(index),
                ids,
            })
        })
        .collect()
}

/// Slots that satisfy `combo`, or `None` when some member is missing.
pub fn find_match(combo: &ComboDefinition, state: &PlayerState) -> Option<EquipPoints> {
    if combo.members.len() < 2 {
        return None;
    }
    let providers = providers(state);
    if providers.len() < combo.members.len() {
        return None;
    }

    // owner[p] = member currently matched to provider p
    let mut owner: Vec<Option<usize>> = vec![None; providers.len()];
    for member in 0..combo.members.len() {
        let mut seen = vec![false; providers.len()];
        if !augment(member, &combo.members, &providers, &mut seen, &mut owner) {
            return None;
        }
    }

    Some(
        owner
            .iter()
            .zip(&providers)
            .filter(|(owner, _)| owner.is_some())
            .fold(EquipPoints::empty(), |acc, (_, p)| acc | p.points),
    )
}

fn augment(
    member: usize,
    members: &[ItemId],
    providers: &[Provider],
    seen: &mut [bool],
    owner: &mut [Option<usize>],
) -> bool {
    for (p, provider) in providers.iter().enumerate() {
        if seen[p] || !provider.ids.contains(&members[member]) {
            continue;
        }
        seen[p] = true;
        let free = match owner[p] {
            None => true,
            Some(other) => augment(other, members, providers, seen, owner),
        };
        if free {
            owner[p] = Some(member);
            return true;
        }
    }
    false
}

/// Combo ids listed by an equipped item and its cards.
pub fn candidates_of(env: &PlayerEnv<'_>, ids: impl IntoIterator<Item = ItemId>) -> Vec<ComboId> {
    let mut out: Vec<ComboId> = Vec::new();
    for id in ids {
        match env.item(id) {
            Ok(item) => {
                for combo in &item.combos {
                    if !out.contains(combo) {
                        out.push(*combo);
                    }
                }
            }
            Err(err) => warn!(item = %id, %err, "combo scan skipped unknown item"),
        }
    }
    out
}

/// Activates every combo in `candidates` that is satisfied and not active yet.
pub fn detect(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    candidates: &[ComboId],
    outbox: &mut Outbox,
) {
    let Ok(oracle) = env.combos() else {
        return;
    };
    for &id in candidates {
        if state.combos.contains(id) {
            continue;
        }
        let Some(combo) = oracle.combo(id) else {
            warn!(combo = id.0, "item lists an unknown combo");
            continue;
        };
        let Some(slots) = find_match(combo, state) else {
            continue;
        };
        let active = ActiveCombo {
            id,
            script: combo.script,
            slots,
        };
        if state.combos.insert(active).is_err() {
            warn!(combo = id.0, "combo table full, combo dropped");
            state.diagnostics.capacity_drops += 1;
            continue;
        }
        debug!(combo = id.0, ?slots, "combo activated");
        outbox.push(Notification::ComboActivated(id));
    }
}

/// Retracts every combo that used one of `freed`.
pub fn retract(state: &mut PlayerState, freed: EquipPoints, outbox: &mut Outbox) -> Vec<ComboId> {
    let retracted: Vec<ComboId> = state
        .combos
        .retract_touching(freed)
        .into_iter()
        .map(|combo| combo.id)
        .collect();
    for &id in &retracted {
        debug!(combo = id.0, "combo retracted");
        outbox.push(Notification::ComboRetracted(id));
    }
    retracted
}

/// Clears and re-detects every combo from the live set.
pub fn rebuild(state: &mut PlayerState, env: &PlayerEnv<'_>, outbox: &mut Outbox) {
    state.combos.clear();
    let ids: Vec<ItemId> = state
        .loadout
        .live
        .distinct()
        .into_iter()
        .filter(|(slot, _)| !slot.is_costume())
        .filter_map(|(_, index)| state.inventory.get(index))
        .flat_map(|item| std::iter::once(item.item).chain(item.cards()))
        .collect();
    let candidates = candidates_of(env, ids);
    detect(state, env, &candidates, outbox);
}
