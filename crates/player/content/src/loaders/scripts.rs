//! Declarative script loader.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_ron};
use crate::scripts::ScriptSpec;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptCatalog {
    pub scripts: Vec<ScriptSpec>,
}

pub struct ScriptLoader;

impl ScriptLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<ScriptSpec>> {
        let catalog: ScriptCatalog = read_ron(path)?;
        Ok(catalog.scripts)
    }
}
