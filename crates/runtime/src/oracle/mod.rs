//! Shared access to the loaded reference tables.
//!
//! The tables are immutable once loaded; every session reads them through
//! the same [`OracleManager`], which hands out [`PlayerEnv`] views on demand.
//! Dynamic state lives in the session worker and the repositories.

use std::path::Path;
use std::sync::Arc;

use player_content::{Content, ContentFactory, LoadResult};
use player_core::{EngineConfig, PlayerEnv};

/// Manages the content tables and provides unified oracle access
#[derive(Clone, Debug)]
pub struct OracleManager {
    content: Arc<Content>,
}

impl OracleManager {
    pub fn new(content: Arc<Content>) -> Self {
        Self { content }
    }

    /// Loads content and engine configuration from a data directory.
    pub fn load(data_dir: impl AsRef<Path>) -> LoadResult<(Self, EngineConfig)> {
        let (content, config) = ContentFactory::new(data_dir.as_ref()).load_all()?;
        Ok((Self::new(Arc::new(content)), config))
    }

    /// Bundles the tables as the oracle set the engine expects.
    pub fn as_player_env(&self) -> PlayerEnv<'_> {
        self.content.env()
    }

    pub fn content(&self) -> &Content {
        &self.content
    }
}

impl From<Content> for OracleManager {
    fn from(content: Content) -> Self {
        Self::new(Arc::new(content))
    }
}
