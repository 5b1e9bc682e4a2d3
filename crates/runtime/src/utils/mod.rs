//! Small helpers shared by runtime components.

pub mod hash;

pub use hash::{DIGEST_LEN, short_hex, snapshot_digest};
