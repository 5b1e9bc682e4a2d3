//! Data-driven reference tables and loaders.
//!
//! This crate supplies the read-only data the progression engine consults:
//! - Jobs and their experience groups
//! - Item catalog (weapons, armor, cards, consumables)
//! - Skill database and per-job skill trees (flattened along job parents)
//! - Equipment combos and zones
//! - Declarative bonus scripts
//! - Engine configuration (TOML)
//!
//! Content is shared by every session and never appears in player state.

pub mod scripts;
pub mod tables;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use scripts::{Condition, ScriptBook, ScriptSpec, ScriptStep};
pub use tables::{ComboTable, ExpGroup, ItemTable, JobTable, SkillTable, TreeSpec, ZoneTable};

#[cfg(feature = "loaders")]
pub use loaders::{
    ComboLoader, ConfigLoader, Content, ContentFactory, ExpLoader, ItemLoader, JobLoader,
    LoadResult, ScriptLoader, SkillLoader, ZoneLoader,
};
