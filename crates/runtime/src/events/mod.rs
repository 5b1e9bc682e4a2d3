//! Topic-based event bus for runtime events.
//!
//! Every notification a command produces is published to the topic its
//! audience calls for; consumers subscribe only to the topics they need.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{PlayerEvent, SessionEvent};
