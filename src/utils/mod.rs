//! Shared utilities.

mod hash;

pub use hash::{content_hash, format_fingerprint};
