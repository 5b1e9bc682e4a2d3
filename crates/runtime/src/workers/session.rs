//! Session worker that owns every logged-in [`PlayerState`].
//!
//! All sessions live on one task: commands from [`crate::RuntimeHandle`]
//! are applied one at a time, so no character is ever mutated concurrently
//! and timer dispatch interleaves deterministically with player commands.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use player_core::{
    CharacterId, CharacterSnapshot, CommandOutcome, EngineConfig, PlayerCommand, PlayerEngine,
    PlayerState, Tick, TimerId,
};

use crate::api::{Result, RuntimeError};
use crate::events::{Event, EventBus, SessionEvent};
use crate::oracle::OracleManager;
use crate::repository::CharacterRepository;

/// Commands that can be sent to the session worker
pub enum Command {
    /// Load a character from the repository and start its session.
    Login {
        character: CharacterId,
        reply: oneshot::Sender<Result<CommandOutcome>>,
    },
    /// Save and close a session.
    Logout {
        character: CharacterId,
        reply: oneshot::Sender<Result<CharacterSnapshot>>,
    },
    /// Apply one engine command to a live session.
    Execute {
        character: CharacterId,
        command: PlayerCommand,
        reply: oneshot::Sender<Result<CommandOutcome>>,
    },
    /// Move the clock forward, firing due timers of every session.
    Advance {
        now: Tick,
        reply: oneshot::Sender<Result<usize>>,
    },
    /// Fire one timer of one session.
    FireTimer {
        character: CharacterId,
        timer: TimerId,
        reply: oneshot::Sender<Result<CommandOutcome>>,
    },
    /// Persistable form of a live session.
    Snapshot {
        character: CharacterId,
        reply: oneshot::Sender<Option<CharacterSnapshot>>,
    },
    /// Save every live session.
    SaveAll { reply: oneshot::Sender<usize> },
    /// Ids of the live sessions.
    Sessions {
        reply: oneshot::Sender<Vec<CharacterId>>,
    },
}

/// Background task that processes session commands.
pub struct SessionWorker {
    sessions: BTreeMap<CharacterId, PlayerState>,
    oracles: OracleManager,
    config: EngineConfig,
    repository: Arc<dyn CharacterRepository>,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    autosave: Option<Duration>,
    now: Tick,
}

impl SessionWorker {
    pub fn new(
        oracles: OracleManager,
        config: EngineConfig,
        repository: Arc<dyn CharacterRepository>,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        autosave: Option<Duration>,
    ) -> Self {
        Self {
            sessions: BTreeMap::new(),
            oracles,
            config,
            repository,
            command_rx,
            event_bus,
            autosave,
            now: Tick::ZERO,
        }
    }

    /// Main worker loop.
    ///
    /// Ends once every handle is dropped, flushing the remaining sessions.
    pub async fn run(mut self) {
        let mut autosave = self.autosave.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                _ = next_autosave(&mut autosave) => {
                    self.save_all();
                }
            }
        }

        let saved = self.save_all();
        info!(saved, "session worker stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Login { character, reply } => {
                let result = self.login(character);
                if reply.send(result).is_err() {
                    debug!("Login reply channel closed (caller dropped)");
                }
            }
            Command::Logout { character, reply } => {
                let result = self.logout(character);
                if reply.send(result).is_err() {
                    debug!("Logout reply channel closed (caller dropped)");
                }
            }
            Command::Execute {
                character,
                command,
                reply,
            } => {
                let result = self.execute(character, command);
                if reply.send(result).is_err() {
                    debug!("Execute reply channel closed (caller dropped)");
                }
            }
            Command::Advance { now, reply } => {
                let result = self.advance(now);
                if reply.send(result).is_err() {
                    debug!("Advance reply channel closed (caller dropped)");
                }
            }
            Command::FireTimer {
                character,
                timer,
                reply,
            } => {
                let result = self.fire_timer(character, timer);
                if reply.send(result).is_err() {
                    debug!("FireTimer reply channel closed (caller dropped)");
                }
            }
            Command::Snapshot { character, reply } => {
                let snapshot = self.sessions.get(&character).map(PlayerState::to_snapshot);
                if reply.send(snapshot).is_err() {
                    debug!("Snapshot reply channel closed (caller dropped)");
                }
            }
            Command::SaveAll { reply } => {
                let saved = self.save_all();
                if reply.send(saved).is_err() {
                    debug!("SaveAll reply channel closed (caller dropped)");
                }
            }
            Command::Sessions { reply } => {
                if reply.send(self.sessions.keys().copied().collect()).is_err() {
                    debug!("Sessions reply channel closed (caller dropped)");
                }
            }
        }
    }

    fn login(&mut self, character: CharacterId) -> Result<CommandOutcome> {
        if self.sessions.contains_key(&character) {
            return Err(RuntimeError::AlreadyLoggedIn(character));
        }
        let snapshot = self
            .repository
            .load(character)?
            .ok_or(RuntimeError::CharacterNotFound(character))?;

        let (state, notifications) = PlayerEngine::login(
            snapshot,
            self.oracles.as_player_env(),
            &self.config,
            self.now,
        )?;
        self.sessions.insert(character, state);

        self.event_bus.publish(Event::Session(SessionEvent::LoggedIn {
            character,
            at: self.now,
        }));
        self.event_bus.publish_all(character, &notifications);
        Ok(CommandOutcome { notifications })
    }

    fn logout(&mut self, character: CharacterId) -> Result<CharacterSnapshot> {
        let mut state = self
            .sessions
            .remove(&character)
            .ok_or(RuntimeError::NotLoggedIn(character))?;
        let snapshot = PlayerEngine::logout(&mut state);
        let saved = self.persist(&snapshot);

        self.event_bus
            .publish(Event::Session(SessionEvent::LoggedOut { character, saved }));
        Ok(snapshot)
    }

    fn execute(&mut self, character: CharacterId, command: PlayerCommand) -> Result<CommandOutcome> {
        let state = self
            .sessions
            .get_mut(&character)
            .ok_or(RuntimeError::NotLoggedIn(character))?;
        let mut engine = PlayerEngine::new(state, self.oracles.as_player_env(), &self.config);
        let outcome = engine.execute(command)?;

        self.event_bus.publish_all(character, &outcome.notifications);
        Ok(outcome)
    }

    /// Returns how many sessions produced notifications.
    fn advance(&mut self, now: Tick) -> Result<usize> {
        if now < self.now {
            warn!(%now, current = %self.now, "clock moved backwards; ignoring");
            return Ok(0);
        }
        self.now = now;

        let env = self.oracles.as_player_env();
        let mut touched = 0;
        for (&character, state) in self.sessions.iter_mut() {
            let mut engine = PlayerEngine::new(state, env, &self.config);
            match engine.execute(PlayerCommand::Advance(now)) {
                Ok(outcome) => {
                    if !outcome.notifications.is_empty() {
                        touched += 1;
                        self.event_bus.publish_all(character, &outcome.notifications);
                    }
                }
                Err(err) => {
                    warn!(character = %character, %err, "timer dispatch failed");
                }
            }
        }
        Ok(touched)
    }

    fn fire_timer(&mut self, character: CharacterId, timer: TimerId) -> Result<CommandOutcome> {
        if !self.sessions.contains_key(&character) {
            debug!(character = %character, timer = timer.0, "timer for closed session ignored");
            return Ok(CommandOutcome::default());
        }
        self.execute(character, PlayerCommand::FireTimer(timer))
    }

    /// Saves one snapshot. Failures are logged, never propagated.
    fn persist(&self, snapshot: &CharacterSnapshot) -> bool {
        match self.repository.save(snapshot) {
            Ok(()) => true,
            Err(err) => {
                error!(character = %snapshot.character.id, %err, "failed to save character");
                false
            }
        }
    }

    fn save_all(&self) -> usize {
        let mut saved = 0;
        let mut failures = 0;
        for state in self.sessions.values() {
            if self.persist(&state.to_snapshot()) {
                saved += 1;
            } else {
                failures += 1;
            }
        }
        if saved + failures > 0 {
            debug!(saved, failures, "sessions saved");
            self.event_bus.publish(Event::Session(SessionEvent::Saved {
                sessions: saved,
                failures,
            }));
        }
        saved
    }
}

async fn next_autosave(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
