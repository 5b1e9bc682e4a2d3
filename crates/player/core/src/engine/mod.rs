//! Command execution pipeline.
//!
//! The [`PlayerEngine`] is the authoritative reducer for one [`PlayerState`].
//! Every mutation, including timer expiry and regeneration, flows through
//! [`PlayerEngine::execute`]:
//!
//! ```text
//! command ─▶ transition (deny before mutating) ─▶ follow-ups
//!         ─▶ skill tree resolve (when levels or skills moved)
//!         ─▶ recompute ─▶ level-up heal ─▶ outbox
//! ```
//!
//! A denied command leaves the state untouched and reports nothing. A
//! successful one recomputes derived state exactly once.

pub mod clock;
pub mod effects;
mod error;
pub mod recompute;

pub use error::CommandError;
pub use recompute::recompute;

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::env::{OracleError, PlayerEnv, ScriptEffect};
use crate::equip::{self, combo};
use crate::error::DenyReason;
use crate::notify::{Notification, Outbox};
use crate::progression::{self, ExpReward, allocation};
use crate::skill;
use crate::state::{
    CharacterSnapshot, EquipPoints, EquipSlot, InventoryIndex, InventoryItem, JobId,
    PlayerState, SNAPSHOT_VERSION, SkillId, StateFlags, StatusKind, Tick, TimerId, ZoneId,
};
use crate::stats::Stat;

/// Every mutation a session can request.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlayerCommand {
    /// Equip inventory item `index`; an empty mask lets the engine choose.
    Equip {
        index: InventoryIndex,
        mask: EquipPoints,
    },
    Unequip {
        slot: EquipSlot,
        force: bool,
    },
    /// Stage an item into the alternate loadout.
    EquipSwitch {
        index: InventoryIndex,
        mask: EquipPoints,
    },
    UnequipSwitch {
        slot: EquipSlot,
    },
    /// Exchange the staged and live sets over `mask` (empty = all).
    Swap {
        mask: EquipPoints,
    },
    LearnSkill(SkillId),
    ResetSkills,
    CopySkill {
        skill: SkillId,
        level: u8,
    },
    GrantSkill {
        skill: SkillId,
        level: u8,
    },
    GainExperience(ExpReward),
    LoseExperience {
        base: u64,
        job: u64,
    },
    ChangeJob(JobId),
    AllocateStat {
        stat: Stat,
        amount: u16,
    },
    ResetStats,
    UseItem(InventoryIndex),
    AddItem(InventoryItem),
    RemoveItem(InventoryIndex),
    StartStatus {
        kind: StatusKind,
        value: i32,
        duration: u64,
    },
    EndStatus(StatusKind),
    StartCooldown {
        skill: SkillId,
        duration: u64,
    },
    /// Activate the autobonus registered at this position of the bonus table.
    TriggerAutobonus(usize),
    ChangeZone(ZoneId),
    SetSitting(bool),
    Die,
    Respawn {
        hp_percent: u8,
    },
    /// Move the character's clock forward, firing due timers.
    Advance(Tick),
    FireTimer(TimerId),
}

/// Notifications produced by one successful command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommandOutcome {
    pub notifications: Vec<Notification>,
}

#[derive(Clone, Copy, Debug, Default)]
struct Followup {
    resolve_tree: bool,
    full_heal: bool,
}

impl Followup {
    const NONE: Self = Self {
        resolve_tree: false,
        full_heal: false,
    };
    const RESOLVE: Self = Self {
        resolve_tree: true,
        full_heal: false,
    };
}

/// Engine that applies [`PlayerCommand`]s to one character.
pub struct PlayerEngine<'a> {
    state: &'a mut PlayerState,
    env: PlayerEnv<'a>,
    config: &'a EngineConfig,
}

impl<'a> PlayerEngine<'a> {
    pub fn new(state: &'a mut PlayerState, env: PlayerEnv<'a>, config: &'a EngineConfig) -> Self {
        Self { state, env, config }
    }

    pub fn state(&self) -> &PlayerState {
        self.state
    }

    /// Rebuilds a session from a persisted snapshot.
    ///
    /// Stats are clamped into the job's caps, combos re-detected, the skill
    /// tree resolved and derived state recomputed. Returns the state and the
    /// notifications describing it.
    ///
    /// # Errors
    ///
    /// `Oracle` when the character's job or a required oracle is missing.
    pub fn login(
        snapshot: CharacterSnapshot,
        env: PlayerEnv<'_>,
        config: &EngineConfig,
        now: Tick,
    ) -> Result<(PlayerState, Vec<Notification>), CommandError> {
        if snapshot.version != SNAPSHOT_VERSION {
            warn!(
                version = snapshot.version,
                expected = SNAPSHOT_VERSION,
                "loading snapshot written by another version"
            );
        }
        let mut state = PlayerState::from_snapshot(snapshot, now);
        if state.diagnostics.capacity_drops > 0 {
            warn!(
                dropped = state.diagnostics.capacity_drops,
                "snapshot held more timed effects than fit"
            );
        }

        let mut outbox = Outbox::new();
        allocation::clamp_to_job(&mut state, &env, config, &mut outbox)?;
        combo::rebuild(&mut state, &env, &mut outbox);
        skill::resolve(&mut state, &env, config, &mut outbox)?;
        recompute(&mut state, &env, config, &mut outbox)?;

        let character = &state.character;
        info!(
            character = %character.id,
            name = %character.name,
            job = %character.job,
            base_level = character.base_level,
            job_level = character.job_level,
            "character logged in"
        );
        Ok((state, outbox.into_vec()))
    }

    /// Produces the snapshot to persist and drops every pending timer.
    pub fn logout(state: &mut PlayerState) -> CharacterSnapshot {
        let snapshot = state.to_snapshot();
        let cancelled = state.cancel_all_timers();
        info!(character = %state.id(), cancelled, "character logged out");
        snapshot
    }

    /// Applies `command`.
    ///
    /// # Errors
    ///
    /// `Denied` with the reason the command was declined, or `Oracle` when
    /// reference data is missing. Derived stats are recomputed either way.
    pub fn execute(&mut self, command: PlayerCommand) -> Result<CommandOutcome, CommandError> {
        let mut outbox = Outbox::new();
        debug!(character = %self.state.id(), ?command, "executing command");

        let followup = match self.dispatch(command, &mut outbox) {
            Ok(followup) => followup,
            Err(err) => {
                // A command can fail after changing part of the state.
                if let Err(skipped) = recompute(self.state, &self.env, self.config, &mut outbox) {
                    warn!(
                        character = %self.state.id(),
                        %skipped,
                        "recompute after failed command skipped"
                    );
                }
                return Err(err);
            }
        };
        if followup.resolve_tree {
            skill::resolve(self.state, &self.env, self.config, &mut outbox)?;
        }
        recompute(self.state, &self.env, self.config, &mut outbox)?;
        if followup.full_heal {
            self.full_heal(&mut outbox);
        }

        Ok(CommandOutcome {
            notifications: outbox.into_vec(),
        })
    }

    fn dispatch(
        &mut self,
        command: PlayerCommand,
        outbox: &mut Outbox,
    ) -> Result<Followup, CommandError> {
        let (state, env, config) = (&mut *self.state, &self.env, self.config);
        match command {
            PlayerCommand::Equip { index, mask } => {
                let outcome = equip::equip(state, env, config, index, mask, outbox)?;
                apply(state, env, config, outcome.effects, outbox)?;
            }
            PlayerCommand::Unequip { slot, force } => {
                let outcome = equip::unequip(state, env, config, slot, force, outbox);
                apply(state, env, config, outcome.effects, outbox)?;
            }
            PlayerCommand::EquipSwitch { index, mask } => {
                equip::equip_switch(state, env, config, index, mask, outbox)?;
            }
            PlayerCommand::UnequipSwitch { slot } => {
                equip::unequip_switch(state, slot, outbox);
            }
            PlayerCommand::Swap { mask } => {
                let outcome = equip::swap(state, env, config, mask, outbox)?;
                apply(state, env, config, outcome.effects, outbox)?;
            }
            PlayerCommand::LearnSkill(skill) => {
                skill::learn_skill(state, env, config, skill, outbox)?;
                return Ok(Followup::RESOLVE);
            }
            PlayerCommand::ResetSkills => {
                skill::reset_skills(state, env, outbox);
                return Ok(Followup::RESOLVE);
            }
            PlayerCommand::CopySkill { skill, level } => {
                skill::copy_skill(state, env, skill, level, outbox)?;
            }
            PlayerCommand::GrantSkill { skill, level } => {
                skill::grant_skill(state, env, skill, level, outbox)?;
                return Ok(Followup::RESOLVE);
            }
            PlayerCommand::GainExperience(reward) => {
                let gain = progression::gain_experience(state, env, config, reward, outbox)?;
                return Ok(Followup {
                    resolve_tree: gain.base_levels > 0 || gain.job_levels > 0,
                    full_heal: gain.base_levels > 0,
                });
            }
            PlayerCommand::LoseExperience { base, job } => {
                progression::lose_experience(state, base, job, outbox);
            }
            PlayerCommand::ChangeJob(job) => {
                let hooks = progression::change_job(state, env, config, job, outbox)?;
                apply(state, env, config, hooks, outbox)?;
            }
            PlayerCommand::AllocateStat { stat, amount } => {
                progression::allocate_stat(state, env, config, stat, amount, outbox)?;
            }
            PlayerCommand::ResetStats => {
                progression::reset_stats(state, config, outbox);
            }
            PlayerCommand::UseItem(index) => {
                effects::use_item(state, env, config, index, outbox)?;
            }
            PlayerCommand::AddItem(item) => {
                effects::add_item(state, env, item, outbox)?;
            }
            PlayerCommand::RemoveItem(index) => {
                let (_, hooks) = effects::remove_item(state, env, index, outbox)?;
                apply(state, env, config, hooks, outbox)?;
            }
            PlayerCommand::StartStatus {
                kind,
                value,
                duration,
            } => {
                let hooks =
                    effects::start_status(state, env, config, kind, value, duration, outbox)?;
                apply(state, env, config, hooks, outbox)?;
            }
            PlayerCommand::EndStatus(kind) => {
                effects::end_status(state, env, config, kind, outbox)?;
            }
            PlayerCommand::StartCooldown { skill, duration } => {
                effects::start_cooldown(state, skill, duration, outbox);
            }
            PlayerCommand::TriggerAutobonus(position) => {
                effects::trigger_autobonus(state, position, outbox)?;
            }
            PlayerCommand::ChangeZone(zone) => {
                if env.zones()?.zone(zone).is_none() {
                    return Err(OracleError::ZoneNotFound(zone).into());
                }
                state.character.zone = zone;
                debug!(zone = zone.0, "zone changed");
            }
            PlayerCommand::SetSitting(sitting) => {
                if state.character.is_dead() {
                    return Err(DenyReason::Dead.into());
                }
                state.character.flags.set(StateFlags::SITTING, sitting);
            }
            PlayerCommand::Die => {
                progression::die(state, env, config, outbox)?;
            }
            PlayerCommand::Respawn { hp_percent } => {
                progression::respawn(state, hp_percent, outbox);
            }
            PlayerCommand::Advance(now) => {
                clock::advance(state, env, config, now, outbox)?;
            }
            PlayerCommand::FireTimer(id) => {
                clock::fire_timer(state, env, config, id, outbox)?;
            }
        }
        Ok(Followup::NONE)
    }

    fn full_heal(&mut self, outbox: &mut Outbox) {
        let battle = self.state.battle;
        let character = &mut self.state.character;
        if character.is_dead() {
            return;
        }
        character.hp = battle.max_hp;
        character.sp = battle.max_sp;
        outbox.push(Notification::Hp {
            hp: battle.max_hp,
            max: battle.max_hp,
        });
        outbox.push(Notification::Sp {
            sp: battle.max_sp,
            max: battle.max_sp,
        });
    }
}

fn apply(
    state: &mut PlayerState,
    env: &PlayerEnv<'_>,
    config: &EngineConfig,
    pending: Vec<ScriptEffect>,
    outbox: &mut Outbox,
) -> Result<(), CommandError> {
    if pending.is_empty() {
        return Ok(());
    }
    effects::apply_effects(state, env, config, pending, outbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{InventoryItem, SkillLevel};
    use crate::stats::Bonus1;
    use crate::testkit::{self, combos, items, jobs, scripts, skills};

    fn run(state: &mut PlayerState, command: PlayerCommand) -> Result<CommandOutcome, CommandError> {
        PlayerEngine::new(state, testkit::env(), testkit::config()).execute(command)
    }

    fn equip(state: &mut PlayerState, index: InventoryIndex) -> CommandOutcome {
        run(
            state,
            PlayerCommand::Equip {
                index,
                mask: EquipPoints::empty(),
            },
        )
        .unwrap()
    }

    #[test]
    fn failed_commands_still_recompute() {
        let mut state = testkit::player(jobs::SWORDMAN, 40, 20);
        let helm = testkit::give(&mut state, InventoryItem::new(items::HELM, 1));
        let def = state.battle.def;
        state.loadout.live.set(EquipSlot::HeadTop, Some(helm));

        let err = run(&mut state, PlayerCommand::UseItem(helm)).unwrap_err();
        assert_eq!(err, CommandError::Denied(DenyReason::NotConsumable));
        assert_eq!(state.battle.def, def + 2);
    }

    #[test]
    fn equip_then_unequip_restores_the_bonus_table() {
        let mut state = testkit::player(jobs::SWORDMAN, 40, 20);
        let helm = testkit::give(&mut state, InventoryItem::new(items::HELM, 1));
        run(&mut state, PlayerCommand::ResetStats).unwrap();
        let bonuses = state.bonuses.clone();
        let battle = state.battle;

        equip(&mut state, helm);
        assert_ne!(state.bonuses, bonuses);
        assert_eq!(state.battle.def, battle.def + 2);

        run(
            &mut state,
            PlayerCommand::Unequip {
                slot: EquipSlot::HeadTop,
                force: false,
            },
        )
        .unwrap();
        assert_eq!(state.bonuses, bonuses);
        assert_eq!(state.battle, battle);
    }

    #[test]
    fn losing_a_member_retracts_only_the_larger_combo() {
        let mut state = testkit::player(jobs::SWORDMAN, 40, 20);
        let helm = testkit::give(&mut state, InventoryItem::new(items::HELM, 1));
        let clip = testkit::give(&mut state, InventoryItem::new(items::CLIP, 1));
        equip(&mut state, helm);
        equip(&mut state, clip);
        let pair_only = state.bonuses.clone();

        let ring = testkit::give(&mut state, InventoryItem::new(items::RING, 1));
        let outcome = equip(&mut state, ring);
        assert!(state.combos.contains(combos::TRIO));
        assert!(state.combos.contains(combos::PAIR));
        assert_eq!(state.skills.level(skills::BASH), 3);
        assert!(outcome.notifications.contains(&Notification::ComboActivated(combos::TRIO)));

        let slot = if state.equipped(EquipSlot::AccL) == Some(ring) {
            EquipSlot::AccL
        } else {
            EquipSlot::AccR
        };
        let outcome = run(&mut state, PlayerCommand::Unequip { slot, force: false }).unwrap();
        assert!(!state.combos.contains(combos::TRIO));
        assert!(state.combos.contains(combos::PAIR));
        assert_eq!(state.bonuses, pair_only);
        assert_eq!(state.skills.get(skills::BASH), None);
        assert!(outcome.notifications.contains(&Notification::ComboRetracted(combos::TRIO)));
        assert!(outcome.notifications.contains(&Notification::SkillRemoved(skills::BASH)));
    }

    #[test]
    fn autobonus_activation_ends_with_its_item() {
        let mut state = testkit::player(jobs::SWORDMAN, 40, 20);
        let slayer = testkit::give(&mut state, InventoryItem::new(items::TWO_HAND_SWORD, 1));
        equip(&mut state, slayer);
        assert_eq!(state.bonuses.autobonuses.len(), 1);
        let aspd = state.bonuses.get(Bonus1::AspdRate);

        run(&mut state, PlayerCommand::TriggerAutobonus(0)).unwrap();
        assert_eq!(state.bonuses.get(Bonus1::AspdRate), aspd + 10);
        let timers = state.timers.len();

        let outcome = run(
            &mut state,
            PlayerCommand::Unequip {
                slot: EquipSlot::HandR,
                force: false,
            },
        )
        .unwrap();
        assert!(state.autobonuses.is_empty());
        assert_eq!(state.timers.len(), timers - 1);
        assert_eq!(state.bonuses.get(Bonus1::AspdRate), 0);
        assert!(
            outcome
                .notifications
                .contains(&Notification::AutobonusEnded(scripts::FURY))
        );
    }

    #[test]
    fn autobonus_expires_on_its_timer() {
        let mut state = testkit::player(jobs::SWORDMAN, 40, 20);
        let slayer = testkit::give(&mut state, InventoryItem::new(items::TWO_HAND_SWORD, 1));
        equip(&mut state, slayer);
        run(&mut state, PlayerCommand::TriggerAutobonus(0)).unwrap();

        run(&mut state, PlayerCommand::Advance(Tick(5_000))).unwrap();
        assert!(state.autobonuses.is_empty());
        assert_eq!(state.bonuses.get(Bonus1::AspdRate), 0);
        assert!(state.is_equipped(slayer));
    }

    #[test]
    fn rental_expiry_unequips_and_removes() {
        let mut state = testkit::player(jobs::SWORDMAN, 40, 20);
        run(
            &mut state,
            PlayerCommand::AddItem(InventoryItem::new(items::HELM, 1).with_expiry(Tick(30_000))),
        )
        .unwrap();
        let helm = state
            .inventory
            .iter()
            .find(|(_, e)| e.item == items::HELM)
            .map(|(i, _)| i)
            .unwrap();
        let battle = state.battle;
        equip(&mut state, helm);
        assert_ne!(state.battle, battle);

        let outcome = run(&mut state, PlayerCommand::Advance(Tick(30_000))).unwrap();
        assert!(state.inventory.get(helm).is_none());
        assert_eq!(state.equipped(EquipSlot::HeadTop), None);
        assert_eq!(state.battle, battle);
        assert!(outcome.notifications.contains(&Notification::ItemRemoved { index: helm }));
    }

    #[test]
    fn denied_commands_leave_no_trace() {
        let mut state = testkit::player(jobs::SWORDMAN, 40, 20);
        let before = state.clone();
        let err = run(
            &mut state,
            PlayerCommand::AllocateStat {
                stat: Stat::Str,
                amount: 5,
            },
        )
        .unwrap_err();
        assert_eq!(err, CommandError::Denied(DenyReason::InsufficientStatPoints));
        assert_eq!(state, before);
    }

    #[test]
    fn base_level_up_heals_fully() {
        let mut state = testkit::player(jobs::SWORDMAN, 10, 5);
        state.character.hp = 1;
        state.character.sp = 0;
        let max_hp = state.battle.max_hp;

        let outcome =
            run(&mut state, PlayerCommand::GainExperience(ExpReward::raw(1_000, 0))).unwrap();
        assert_eq!(state.character.base_level, 11);
        assert!(state.battle.max_hp > max_hp);
        assert_eq!(state.character.hp, state.battle.max_hp);
        assert_eq!(state.character.sp, state.battle.max_sp);
        assert!(
            outcome
                .notifications
                .contains(&Notification::BaseLevelUp { level: 11 })
        );
    }

    #[test]
    fn job_level_up_unlocks_tree_entries() {
        let mut state = testkit::player(jobs::SWORDMAN, 10, 4);
        state.skills.set(skills::BASH, SkillLevel::Permanent(5));
        assert!(!state.skills.is_available(skills::MAGNUM_BREAK));

        run(&mut state, PlayerCommand::GainExperience(ExpReward::raw(0, 200))).unwrap();
        assert_eq!(state.character.job_level, 5);
        assert!(state.skills.is_available(skills::MAGNUM_BREAK));
    }

    #[test]
    fn snapshot_round_trip_rebuilds_identical_state() {
        let mut state = testkit::player(jobs::SWORDMAN, 40, 20);
        for item in [items::HELM, items::CLIP, items::RING] {
            let index = testkit::give(&mut state, InventoryItem::new(item, 1));
            equip(&mut state, index);
        }
        let slayer = testkit::give(&mut state, InventoryItem::new(items::TWO_HAND_SWORD, 1));
        run(
            &mut state,
            PlayerCommand::EquipSwitch {
                index: slayer,
                mask: EquipPoints::empty(),
            },
        )
        .unwrap();
        run(
            &mut state,
            PlayerCommand::StartStatus {
                kind: StatusKind::Blessing,
                value: 5,
                duration: 60_000,
            },
        )
        .unwrap();

        let snapshot = PlayerEngine::logout(&mut state);
        assert!(state.timers.is_empty());
        let (restored, _) =
            PlayerEngine::login(snapshot, testkit::env(), testkit::config(), Tick::ZERO).unwrap();

        assert_eq!(restored.character, state.character);
        assert_eq!(restored.loadout, state.loadout);
        assert_eq!(restored.bonuses, state.bonuses);
        assert_eq!(restored.battle, state.battle);
        assert_eq!(restored.skills, state.skills);
        assert_eq!(
            restored.statuses.get(StatusKind::Blessing).map(|s| s.expires_at),
            Some(Tick(60_000))
        );
    }

    #[test]
    fn soul_link_opens_linked_skills() {
        let mut state = testkit::player(jobs::KNIGHT, 60, 30);
        assert!(!state.skills.is_available(skills::SPIRIT_BLADE));

        run(
            &mut state,
            PlayerCommand::StartStatus {
                kind: StatusKind::SoulLink(jobs::KNIGHT),
                value: 1,
                duration: 10_000,
            },
        )
        .unwrap();
        assert!(state.skills.is_available(skills::SPIRIT_BLADE));

        run(&mut state, PlayerCommand::Advance(Tick(10_000))).unwrap();
        assert!(!state.skills.is_available(skills::SPIRIT_BLADE));
    }

    #[test]
    fn unknown_zones_are_rejected() {
        let mut state = testkit::player(jobs::SWORDMAN, 40, 20);
        let err = run(&mut state, PlayerCommand::ChangeZone(ZoneId(77))).unwrap_err();
        assert_eq!(err, CommandError::Oracle(OracleError::ZoneNotFound(ZoneId(77))));

        run(&mut state, PlayerCommand::ChangeZone(testkit::zones::ARENA)).unwrap();
        assert_eq!(state.character.zone, testkit::zones::ARENA);
    }

    #[test]
    fn dead_characters_respawn_with_part_of_their_hp() {
        let mut state = testkit::player(jobs::SWORDMAN, 40, 20);
        let outcome = run(&mut state, PlayerCommand::Die).unwrap();
        assert!(outcome.notifications.contains(&Notification::Died));
        assert_eq!(
            run(&mut state, PlayerCommand::SetSitting(true)).unwrap_err(),
            CommandError::Denied(DenyReason::Dead)
        );

        run(&mut state, PlayerCommand::Respawn { hp_percent: 100 }).unwrap();
        assert_eq!(state.character.hp, state.battle.max_hp);
    }
}
