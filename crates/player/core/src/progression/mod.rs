//! Progression state machine.
//!
//! ```text
//!   Alive ──die──▶ Dead ──respawn──▶ Alive
//!     │
//!     ├─ gain/lose experience ─▶ base level ↑ / job level ↑ (up to the job cap)
//!     ├─ allocate / reset stats
//!     └─ change job ─▶ job level 1, prune, unequip, resolve
//! ```
//!
//! Every transition leaves derived stats stale; the engine recomputes once
//! per command.
pub mod allocation;
pub mod death;
pub mod exp;
pub mod job;

pub use allocation::{allocate_stat, reset_stats};
pub use death::{death_penalty, die, respawn};
pub use exp::{
    ExpFlags, ExpGain, ExpReward, ExpSource, Track, adjusted, gain_experience, lose_experience,
    status_award,
};
pub use job::change_job;
