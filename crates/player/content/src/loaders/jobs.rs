//! Job and experience table loaders.

use std::path::Path;

use player_core::JobDefinition;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_ron};
use crate::tables::ExpGroup;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCatalog {
    pub jobs: Vec<JobDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpCatalog {
    pub groups: Vec<ExpGroup>,
}

pub struct JobLoader;

impl JobLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<JobDefinition>> {
        let catalog: JobCatalog = read_ron(path)?;
        Ok(catalog.jobs)
    }
}

pub struct ExpLoader;

impl ExpLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<ExpGroup>> {
        let catalog: ExpCatalog = read_ron(path)?;
        Ok(catalog.groups)
    }
}
