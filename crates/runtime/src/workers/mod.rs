//! Worker tasks that back the runtime orchestration.
//!
//! The session worker owns every live character; the runtime only talks to
//! it through [`Command`]s.

mod session;

pub use session::{Command, SessionWorker};
