//! Read and inspect saved characters.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use player_core::CharacterId;
use runtime::{CharacterRepository, FileCharacterRepository};

use crate::dirs;

/// Read and inspect a saved character
#[derive(Parser)]
pub struct Inspect {
    /// Character id to read; omit to list every saved character
    #[arg(value_name = "CHARACTER")]
    character: Option<u32>,

    /// Save directory (defaults to PLAYER_SAVE_DIR)
    #[arg(short, long, value_name = "DIR")]
    save_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Levels, experience and points
    Summary,
    /// Full JSON export
    Json,
}

impl Inspect {
    pub fn execute(self) -> Result<()> {
        let Some(dir) = dirs::save_dir(self.save_dir) else {
            bail!("No save directory: pass --save-dir or set PLAYER_SAVE_DIR");
        };
        let repository = FileCharacterRepository::new(&dir)
            .with_context(|| format!("Failed to open save directory: {}", dir.display()))?;

        let Some(id) = self.character.map(CharacterId) else {
            for id in repository.list()? {
                println!("{id}");
            }
            return Ok(());
        };

        match self.format {
            OutputFormat::Json => {
                let json = repository
                    .export_json(id)?
                    .with_context(|| format!("Character {id} has no save"))?;
                println!("{json}");
            }
            OutputFormat::Summary => {
                let snapshot = repository
                    .load(id)?
                    .with_context(|| format!("Character {id} has no save"))?;
                let c = &snapshot.character;
                println!("{} ({}) job {}", c.name, c.id, c.job);
                println!("  base {:>3}  exp {}", c.base_level, c.base_exp);
                println!("  job  {:>3}  exp {}", c.job_level, c.job_exp);
                println!(
                    "  points: {} status, {} skill",
                    c.status_points, c.skill_points
                );
                println!("  hp {}  sp {}", c.hp, c.sp);
                println!(
                    "  {} skills, {} items, {} statuses",
                    snapshot.skills.len(),
                    snapshot.inventory.iter().count(),
                    snapshot.statuses.len()
                );
            }
        }
        Ok(())
    }
}
