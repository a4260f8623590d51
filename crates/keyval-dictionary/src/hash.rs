#![deny(unsafe_code)]

use sha2::Digest;

/// Length of the abbreviated fingerprint shown in terminal output.
pub const SHORT_FINGERPRINT_LEN: usize = 12;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    hex::encode(digest)
}

pub fn short_fingerprint(fingerprint: &str) -> &str {
    fingerprint
        .get(..SHORT_FINGERPRINT_LEN)
        .unwrap_or(fingerprint)
}
