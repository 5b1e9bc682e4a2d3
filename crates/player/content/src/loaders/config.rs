//! Engine configuration loader.

use std::path::Path;

use anyhow::Context;
use player_core::EngineConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for engine configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads an [`EngineConfig`]; keys missing from the file keep their defaults.
    pub fn load(path: &Path) -> LoadResult<EngineConfig> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("Failed to parse config TOML at {}", path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<EngineConfig> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use player_core::stats::StatCostCurve;

    #[test]
    fn partial_files_keep_defaults() {
        let config = ConfigLoader::parse(
            r#"
            multi_level_up = true
            death_penalty_base = 300
            stat_cost = { Table = [1, 1, 2, 2, 3] }

            [[level_gap]]
            min_diff = 16
            max_diff = 1000
            rate = 40
            "#,
        )
        .unwrap();

        assert!(config.multi_level_up);
        assert_eq!(config.death_penalty_base, 300);
        assert_eq!(config.death_penalty_job, EngineConfig::default().death_penalty_job);
        assert_eq!(config.stat_cost, StatCostCurve::Table(vec![1, 1, 2, 2, 3]));
        assert_eq!(config.level_gap_rate(20), 40);
        assert_eq!(config.level_gap_rate(0), 100);
    }
}
