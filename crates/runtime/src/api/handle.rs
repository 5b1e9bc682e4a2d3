//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! driving sessions or streaming events from specific topics.
use tokio::sync::{broadcast, mpsc, oneshot};

use player_core::{CharacterId, CharacterSnapshot, CommandOutcome, PlayerCommand, Tick, TimerId};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Load a saved character and open its session.
    ///
    /// The outcome carries the notifications of the initial recompute.
    pub async fn login(&self, character: CharacterId) -> Result<CommandOutcome> {
        self.request(|reply| Command::Login { character, reply }).await?
    }

    /// Close a session, saving it first. Returns the saved snapshot even
    /// when the repository rejected it.
    pub async fn logout(&self, character: CharacterId) -> Result<CharacterSnapshot> {
        self.request(|reply| Command::Logout { character, reply }).await?
    }

    /// Apply one command to a live session.
    pub async fn execute(
        &self,
        character: CharacterId,
        command: PlayerCommand,
    ) -> Result<CommandOutcome> {
        self.request(|reply| Command::Execute {
            character,
            command,
            reply,
        })
        .await?
    }

    /// Move the runtime clock to `now`, firing due timers of every session.
    ///
    /// Returns how many sessions changed.
    pub async fn advance(&self, now: Tick) -> Result<usize> {
        self.request(|reply| Command::Advance { now, reply }).await?
    }

    /// Fire one timer. Missing sessions and unknown timers are no-ops.
    pub async fn fire_timer(
        &self,
        character: CharacterId,
        timer: TimerId,
    ) -> Result<CommandOutcome> {
        self.request(|reply| Command::FireTimer {
            character,
            timer,
            reply,
        })
        .await?
    }

    /// Persistable form of a live session, `None` if it is not logged in.
    pub async fn snapshot(&self, character: CharacterId) -> Result<Option<CharacterSnapshot>> {
        self.request(|reply| Command::Snapshot { character, reply }).await
    }

    /// Save every live session; returns how many saves succeeded.
    pub async fn save_all(&self) -> Result<usize> {
        self.request(|reply| Command::SaveAll { reply }).await
    }

    /// Ids of the live sessions, ascending.
    pub async fn sessions(&self) -> Result<Vec<CharacterId>> {
        self.request(|reply| Command::Sessions { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Player` - changes only the owning client sees
    /// - `Topic::Peers` - changes party and guild members also see
    /// - `Topic::Session` - login, logout and saves
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::Topic;
    ///
    /// let mut party_rx = handle.subscribe(Topic::Peers);
    /// while let Ok(event) = party_rx.recv().await {
    ///     // update party frames
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> Vec<(Topic, broadcast::Receiver<Event>)> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
