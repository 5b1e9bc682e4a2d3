//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use player_core::{Audience, CharacterId, Notification};

use super::types::{PlayerEvent, SessionEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Changes only the character's own client needs
    Player,
    /// Changes party and guild members also see (level, HP, job, looks)
    Peers,
    /// Login, logout and save events
    Session,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Player, Topic::Peers, Topic::Session];
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Player(PlayerEvent),
    Session(SessionEvent),
}

impl Event {
    pub fn notification(character: CharacterId, notification: Notification) -> Self {
        Event::Player(PlayerEvent {
            character,
            notification,
        })
    }

    pub fn topic(&self) -> Topic {
        match self {
            Event::Player(event) => match event.notification.audience() {
                Audience::SelfOnly => Topic::Player,
                Audience::Peers => Topic::Peers,
            },
            Event::Session(_) => Topic::Session,
        }
    }
}

/// Topic-based event bus
///
/// Each topic has its own broadcast channel, so a party frame that only
/// follows [`Topic::Peers`] never sees weight or skill-point chatter.
/// Publishing is best-effort: events sent while nobody listens are dropped,
/// and lagging receivers lose the oldest events.
#[derive(Clone)]
pub struct EventBus {
    player: broadcast::Sender<Event>,
    peers: broadcast::Sender<Event>,
    session: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            player: broadcast::channel(capacity).0,
            peers: broadcast::channel(capacity).0,
            session: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Player => &self.player,
            Topic::Peers => &self.peers,
            Topic::Session => &self.session,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Publish every notification of one command for `character`.
    pub fn publish_all(&self, character: CharacterId, notifications: &[Notification]) {
        for notification in notifications {
            self.publish(Event::notification(character, *notification));
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> Vec<(Topic, broadcast::Receiver<Event>)> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notifications_route_by_audience() {
        let bus = EventBus::with_capacity(8);
        let mut own = bus.subscribe(Topic::Player);
        let mut party = bus.subscribe(Topic::Peers);

        bus.publish_all(
            CharacterId(1),
            &[
                Notification::StatusPoints(3),
                Notification::BaseLevelUp { level: 2 },
            ],
        );

        assert_eq!(
            own.recv().await.unwrap(),
            Event::notification(CharacterId(1), Notification::StatusPoints(3))
        );
        assert_eq!(
            party.recv().await.unwrap(),
            Event::notification(CharacterId(1), Notification::BaseLevelUp { level: 2 })
        );
        assert!(own.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let bus = EventBus::new();
        bus.publish(Event::Session(SessionEvent::Saved {
            sessions: 0,
            failures: 0,
        }));
    }
}
