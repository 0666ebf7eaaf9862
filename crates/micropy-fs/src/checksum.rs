//! SHA-256 checksum utilities
//!
//! Stub repositories publish bare hex digests for their archives, so
//! these helpers return lowercase hex without a prefix.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hex digest of a byte slice.
pub fn compute_bytes_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Compare a computed digest with an expected one, ignoring case and an
/// optional `sha256:` prefix on the expected value.
pub fn matches(expected: &str, actual: &str) -> bool {
    let expected = expected.trim();
    let expected = expected.strip_prefix("sha256:").unwrap_or(expected);
    expected.eq_ignore_ascii_case(actual)
}
