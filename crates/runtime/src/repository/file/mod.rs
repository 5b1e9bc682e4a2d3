//! File-backed repository implementations.

mod character;

pub use character::FileCharacterRepository;
