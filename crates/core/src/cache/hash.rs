//! Cache key generation for stored entries.

use sha2::{Digest, Sha256};

/// Compute the primary key for a cache entry.
///
/// Keys are scoped per partition so the same URL can live in several
/// partitions at once (e.g. a page body in both static and dynamic).
pub fn entry_key(partition: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(partition.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
