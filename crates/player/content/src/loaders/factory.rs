//! Content factory for building oracles from data files.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use player_core::env::{ItemOracle, JobOracle};
use player_core::{EngineConfig, PlayerEnv};
use tracing::{info, warn};

use crate::loaders::{
    ComboLoader, ConfigLoader, ExpLoader, ItemLoader, JobLoader, LoadResult, ScriptLoader,
    SkillLoader, ZoneLoader,
};
use crate::scripts::ScriptBook;
use crate::tables::{ComboTable, ItemTable, JobTable, SkillTable, ZoneTable};

/// Every reference table the engine reads, loaded and cross-checked.
#[derive(Debug, Default)]
pub struct Content {
    pub jobs: JobTable,
    pub items: ItemTable,
    pub skills: SkillTable,
    pub combos: ComboTable,
    pub zones: ZoneTable,
    pub scripts: ScriptBook,
}

impl Content {
    /// Bundles the tables as the oracle set the engine expects.
    pub fn env(&self) -> PlayerEnv<'_> {
        PlayerEnv::with_all(
            &self.jobs,
            &self.items,
            &self.skills,
            &self.combos,
            &self.zones,
            &self.scripts,
        )
    }
}

/// Content factory that loads all reference data from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── jobs.ron
/// ├── exp.ron
/// ├── items.ron
/// ├── skills.ron
/// ├── combos.ron
/// ├── zones.ron
/// └── scripts.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load engine configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<EngineConfig> {
        ConfigLoader::load(&self.data_dir.join("config.toml"))
    }

    /// Loads and cross-checks every table.
    ///
    /// Dangling references (an item naming an unknown script, a combo
    /// naming an unknown item, a job whose parent is missing) are load
    /// errors: the engine treats content as trusted.
    pub fn load_content(&self) -> LoadResult<Content> {
        let mut jobs = JobTable::new();
        for def in JobLoader::load(&self.data_dir.join("jobs.ron"))? {
            jobs.add_job(def);
        }
        for group in ExpLoader::load(&self.data_dir.join("exp.ron"))? {
            jobs.add_exp_group(group);
        }

        let mut items = ItemTable::new();
        let item_defs = ItemLoader::load(&self.data_dir.join("items.ron"))?;
        for def in item_defs.iter().cloned() {
            items.add_definition(def);
        }

        let catalog = SkillLoader::load(&self.data_dir.join("skills.ron"))?;
        let skills = SkillTable::new(catalog.skills, catalog.trees, &jobs);

        let combo_defs = ComboLoader::load(&self.data_dir.join("combos.ron"))?;
        let zones = ZoneTable::new(ZoneLoader::load(&self.data_dir.join("zones.ron"))?);
        let scripts = ScriptBook::new(ScriptLoader::load(&self.data_dir.join("scripts.ron"))?);

        for def in jobs.iter() {
            if let Some(parent) = def.parent
                && jobs.job(parent).is_none()
            {
                bail!("job {} names unknown parent {}", def.id, parent);
            }
            if jobs.base_exp_threshold(def.id, 1).is_none() {
                warn!(job = %def.id, "job has no experience group; it can never level");
            }
        }
        for def in &item_defs {
            for script in [def.equip_script, def.unequip_script, def.use_script]
                .into_iter()
                .flatten()
            {
                if scripts.get(script).is_none() {
                    bail!("item {} names unknown script {:?}", def.id, script);
                }
            }
        }
        for combo in &combo_defs {
            if let Some(missing) = combo.members.iter().find(|m| items.item(**m).is_none()) {
                bail!("combo {:?} names unknown item {}", combo.id, missing);
            }
            if scripts.get(combo.script).is_none() {
                bail!("combo {:?} names unknown script {:?}", combo.id, combo.script);
            }
        }

        info!(
            jobs = jobs.len(),
            items = items.len(),
            combos = combo_defs.len(),
            scripts = scripts.len(),
            "content loaded"
        );
        Ok(Content {
            jobs,
            items,
            skills,
            combos: ComboTable::new(combo_defs),
            zones,
            scripts,
        })
    }

    /// Loads the content and the configuration in one go.
    pub fn load_all(&self) -> LoadResult<(Content, EngineConfig)> {
        let content = self
            .load_content()
            .with_context(|| format!("loading content from {}", self.data_dir.display()))?;
        Ok((content, self.load_config()?))
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
