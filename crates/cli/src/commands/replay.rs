//! Replay a scenario against a live runtime.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{info, warn};

use player_core::{CharacterId, GameError};
use runtime::{
    CharacterRepository, Event, FileCharacterRepository, InMemoryCharacterRepository,
    OracleManager, PlayerEvent, ResultCode, Runtime, RuntimeConfig, RuntimeHandle, SessionEvent,
    Topic,
};

use crate::dirs;
use crate::scenario::{Scenario, Step};

/// Replay a RON scenario and log every notification
#[derive(Parser)]
pub struct Replay {
    /// Scenario file to replay (e.g., crates/cli/demos/knight.ron)
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    /// Content directory (defaults to PLAYER_DATA_DIR or the shipped tables)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Save characters to this directory (defaults to PLAYER_SAVE_DIR, or memory)
    #[arg(short, long, value_name = "DIR")]
    save_dir: Option<PathBuf>,

    /// Overwrite existing saves with the scenario's seed characters
    #[arg(long)]
    fresh: bool,
}

impl Replay {
    pub async fn execute(self) -> Result<()> {
        let scenario = Scenario::load(&self.scenario)?;
        let data_dir = dirs::data_dir(self.data_dir);
        let (oracles, engine) = OracleManager::load(&data_dir)?;

        let repository: Arc<dyn CharacterRepository> = match dirs::save_dir(self.save_dir) {
            Some(dir) => {
                info!("Saving characters to {}", dir.display());
                Arc::new(FileCharacterRepository::new(&dir).with_context(|| {
                    format!("Failed to open save directory: {}", dir.display())
                })?)
            }
            None => Arc::new(InMemoryCharacterRepository::new()),
        };

        for seed in &scenario.characters {
            if self.fresh || !repository.exists(seed.id) {
                repository
                    .save(&seed.snapshot())
                    .with_context(|| format!("Failed to seed character {}", seed.id))?;
                info!(character = %seed.id, name = %seed.name, "seeded character");
            }
        }

        let runtime = Runtime::builder()
            .content(oracles)
            .repository(repository)
            .config(RuntimeConfig {
                engine,
                autosave_interval: None,
                ..RuntimeConfig::default()
            })
            .build()?;
        let handle = runtime.handle();
        let mut tap = Tap::new(&handle);

        info!(steps = scenario.steps.len(), "replaying {}", self.scenario.display());
        for (n, step) in scenario.steps.into_iter().enumerate() {
            run_step(&handle, n, step).await?;
            tap.flush();
        }

        handle.save_all().await?;
        tap.flush();
        drop(handle);
        runtime.shutdown().await?;
        Ok(())
    }
}

/// Runs one step. Engine refusals are logged and the replay goes on; only
/// a dead runtime aborts it.
async fn run_step(handle: &RuntimeHandle, n: usize, step: Step) -> Result<()> {
    let (label, result) = match step {
        Step::Login(character) => ("login", handle.login(character).await.map(drop)),
        Step::Logout(character) => ("logout", handle.logout(character).await.map(drop)),
        Step::Execute { character, command } => {
            info!(step = n, character = %character, ?command, "execute");
            ("execute", handle.execute(character, command).await.map(drop))
        }
        Step::Advance(now) => ("advance", handle.advance(now).await.map(drop)),
        Step::FireTimer { character, timer } => (
            "fire_timer",
            handle.fire_timer(character, timer).await.map(drop),
        ),
        Step::Show(character) => ("show", show(handle, character).await),
        Step::SaveAll => ("save_all", handle.save_all().await.map(drop)),
    };

    if let Err(err) = &result {
        let code = ResultCode::from(err);
        if code == ResultCode::Internal {
            return Err(anyhow::anyhow!("step {n} ({label}) failed: {err}"));
        }
        warn!(
            step = n,
            code = code.as_u16(),
            reason = err.error_code(),
            "{label} refused: {err}"
        );
    }
    Ok(())
}

async fn show(handle: &RuntimeHandle, character: CharacterId) -> runtime::Result<()> {
    match handle.snapshot(character).await? {
        Some(snapshot) => {
            let c = &snapshot.character;
            info!(
                character = %c.id,
                name = %c.name,
                job = %c.job,
                base_level = c.base_level,
                job_level = c.job_level,
                base_exp = c.base_exp,
                job_exp = c.job_exp,
                status_points = c.status_points,
                skill_points = c.skill_points,
                hp = c.hp,
                sp = c.sp,
                skills = snapshot.skills.len(),
                items = snapshot.inventory.iter().count(),
                "character"
            );
            Ok(())
        }
        None => Err(runtime::RuntimeError::NotLoggedIn(character)),
    }
}

/// Subscriptions to every topic, drained after each step so the log keeps
/// step order.
struct Tap {
    receivers: Vec<(Topic, broadcast::Receiver<Event>)>,
}

impl Tap {
    fn new(handle: &RuntimeHandle) -> Self {
        Self {
            receivers: handle.subscribe_multiple(&Topic::ALL),
        }
    }

    fn flush(&mut self) {
        for (topic, rx) in &mut self.receivers {
            loop {
                match rx.try_recv() {
                    Ok(Event::Player(PlayerEvent {
                        character,
                        notification,
                    })) => info!(?topic, character = %character, "{notification:?}"),
                    Ok(Event::Session(event)) => log_session(event),
                    Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                        warn!(?topic, missed, "event log fell behind");
                    }
                    Err(_) => break,
                }
            }
        }
    }
}

fn log_session(event: SessionEvent) {
    match event {
        SessionEvent::LoggedIn { character, at } => {
            info!(character = %character, at = %at, "logged in")
        }
        SessionEvent::LoggedOut { character, saved } => {
            info!(character = %character, saved, "logged out")
        }
        SessionEvent::Saved { sessions, failures } => {
            info!(sessions, failures, "sessions saved")
        }
    }
}
