//! Digest helpers for persisted snapshots.

use sha2::{Digest, Sha256};

/// Length in bytes of a snapshot digest.
pub const DIGEST_LEN: usize = 32;

/// SHA-256 over the encoded snapshot bytes.
pub fn snapshot_digest(bytes: &[u8]) -> [u8; DIGEST_LEN] {
    Sha256::digest(bytes).into()
}

/// First 8 bytes of a digest as hex, for compact logging.
pub fn short_hex(digest: &[u8; DIGEST_LEN]) -> String {
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_consistency() {
        let a = snapshot_digest(b"knight");
        assert_eq!(a, snapshot_digest(b"knight"));
        assert_ne!(a, snapshot_digest(b"knigHt"));
    }

    #[test]
    fn test_short_hex_format() {
        let hex = short_hex(&snapshot_digest(b""));
        assert_eq!(hex.len(), 16);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
