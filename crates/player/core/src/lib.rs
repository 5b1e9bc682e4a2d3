//! Deterministic attribute and progression rules for player characters.
//!
//! `player-core` owns the canonical per-character rules: primary and derived
//! stats, the bonus accumulator, equipment and combos, the skill tree and
//! level progression. It performs no I/O; reference data arrives through the
//! oracle traits in [`env`], and every mutation flows through
//! [`engine::PlayerEngine`], which reports observable changes as
//! [`notify::Notification`]s.
pub mod config;
pub mod engine;
pub mod env;
pub mod equip;
pub mod error;
pub mod notify;
pub mod progression;
pub mod skill;
pub mod state;
pub mod stats;

#[cfg(test)]
pub(crate) mod testkit;

pub use config::{EngineConfig, LevelGapBand, VipTierRule};
pub use engine::{CommandError, CommandOutcome, PlayerCommand, PlayerEngine};
pub use env::{
    ComboDefinition, ComboOracle, Env, ItemDefinition, ItemKind, ItemOracle, JobDefinition,
    JobOracle, OracleError, PlayerEnv, ScriptContext, ScriptEffect, ScriptEngine, SkillDefinition,
    SkillOracle, SkillTreeEntry, ZoneDefinition, ZoneOracle,
};
pub use error::{DenyReason, ErrorSeverity, GameError};
pub use notify::{Audience, Notification, Outbox, StatusFields};
pub use progression::{ExpFlags, ExpGain, ExpReward, ExpSource};
pub use state::{
    AccountId, Character, CharacterId, CharacterSnapshot, ComboId, EquipPoints, EquipSlot,
    InventoryIndex, InventoryItem, ItemId, JobId, PlayerState, ScriptId, SkillId, SkillLevel,
    StatusKind, Tick, TimerId, ZoneId,
};
pub use stats::{BattleStatus, Bonus1, Bonus2, BonusTable, EffectiveStats, PrimaryStats, Stat};
