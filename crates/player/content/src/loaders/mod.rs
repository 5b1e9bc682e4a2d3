//! Content loaders for reading reference data from files.
//!
//! RON holds the tables (jobs, experience, items, skills, combos, zones,
//! scripts); TOML holds the engine configuration.

pub mod config;
pub mod factory;
pub mod items;
pub mod jobs;
pub mod scripts;
pub mod skills;
pub mod zones;

pub use config::ConfigLoader;
pub use factory::{Content, ContentFactory};
pub use items::ItemLoader;
pub use jobs::{ExpLoader, JobLoader};
pub use scripts::ScriptLoader;
pub use skills::SkillLoader;
pub use zones::{ComboLoader, ZoneLoader};

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file {}", path.display()))
}

/// Reads and parses a RON file with the newtype and `Some` shorthands enabled.
pub(crate) fn read_ron<T: DeserializeOwned>(path: &Path) -> LoadResult<T> {
    let content = read_file(path)?;
    parse_ron(&content).with_context(|| format!("Failed to parse RON at {}", path.display()))
}

pub(crate) fn parse_ron<T: DeserializeOwned>(content: &str) -> LoadResult<T> {
    let options = ron::Options::default()
        .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
        .with_default_extension(ron::extensions::Extensions::UNWRAP_NEWTYPES);
    Ok(options.from_str(content)?)
}
