//! Skill database and skill tree loader.

use std::path::Path;

use player_core::SkillDefinition;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_ron};
use crate::tables::TreeSpec;

/// Skill definitions plus the entries each job declares itself; inherited
/// entries are added when the table is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillCatalog {
    pub skills: Vec<SkillDefinition>,
    #[serde(default)]
    pub trees: Vec<TreeSpec>,
}

pub struct SkillLoader;

impl SkillLoader {
    pub fn load(path: &Path) -> LoadResult<SkillCatalog> {
        read_ron(path)
    }
}
