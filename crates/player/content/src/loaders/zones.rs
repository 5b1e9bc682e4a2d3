//! Combo and zone loaders.

use std::path::Path;

use player_core::{ComboDefinition, ZoneDefinition};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_ron};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboCatalog {
    pub combos: Vec<ComboDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneCatalog {
    pub zones: Vec<ZoneDefinition>,
}

pub struct ComboLoader;

impl ComboLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<ComboDefinition>> {
        let catalog: ComboCatalog = read_ron(path)?;
        Ok(catalog.combos)
    }
}

pub struct ZoneLoader;

impl ZoneLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<ZoneDefinition>> {
        let catalog: ZoneCatalog = read_ron(path)?;
        Ok(catalog.zones)
    }
}
