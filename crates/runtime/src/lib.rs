//! Runtime orchestration for player sessions.
//!
//! This crate wires the deterministic rules of `player-core` and the tables
//! of `player-content` into a long-running service. Consumers embed
//! [`Runtime`] to log characters in and out, apply commands, dispatch timers,
//! and subscribe to the notifications those produce through
//! [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - [`oracle`] shares the loaded content across sessions
//! - [`repository`] persists character snapshots
//! - `workers` keeps the session task internal to the crate
pub mod api;
pub mod events;
pub mod oracle;
pub mod repository;
pub mod runtime;

mod utils;
mod workers;

pub use api::{Result, ResultCode, RuntimeError, RuntimeHandle};
pub use events::{Event, EventBus, PlayerEvent, SessionEvent, Topic};
pub use oracle::OracleManager;
pub use repository::{
    CharacterRepository, FileCharacterRepository, InMemoryCharacterRepository, RepositoryError,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
