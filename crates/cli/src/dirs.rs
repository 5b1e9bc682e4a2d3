//! Default locations for content and saves.

use std::path::PathBuf;

/// Content directory: explicit flag, then `PLAYER_DATA_DIR`, then the
/// tables shipped with `player-content`.
pub fn data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os("PLAYER_DATA_DIR").map(PathBuf::from))
        .unwrap_or_else(|| {
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../player/content/data")
        })
}

/// Save directory: explicit flag, then `PLAYER_SAVE_DIR`. `None` keeps
/// characters in memory.
pub fn save_dir(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| std::env::var_os("PLAYER_SAVE_DIR").map(PathBuf::from))
}
