//! Content hashing utilities.

use xxhash_rust::xxh3::xxh3_64;

/// Compute a content hash for arbitrary bytes
pub fn content_hash(data: &[u8]) -> u64 {
    xxh3_64(data)
}

/// Render a hash as a fixed-width lowercase hex fingerprint
#[must_use]
pub fn format_fingerprint(hash: u64) -> String {
    format!("{hash:016x}")
}
