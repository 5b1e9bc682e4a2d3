//! Character persistence.
//!
//! The runtime only ever stores [`player_core::CharacterSnapshot`]s; the
//! repositories here decide where they live.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileCharacterRepository;
pub use memory::InMemoryCharacterRepository;
pub use traits::CharacterRepository;
