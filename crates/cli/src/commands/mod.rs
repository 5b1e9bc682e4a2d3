mod inspect;
mod replay;

pub use inspect::Inspect;
pub use replay::Replay;
