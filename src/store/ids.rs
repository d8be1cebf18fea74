use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Prefix shared by every generated entry id
pub const ID_PREFIX: &str = "k-";

/// Derive an entry id from its content, category and creation time.
///
/// The id is `k-` followed by the first 8 bytes of a SHA-256 digest in hex.
/// `nonce` is mixed in on retries when a generated id is already taken.
pub fn generate_id(content: &str, category: &str, created_at: DateTime<Utc>, nonce: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update(category.as_bytes());
    hasher.update(created_at.to_rfc3339().as_bytes());
    if nonce > 0 {
        hasher.update(nonce.to_le_bytes());
    }
    let digest = hasher.finalize();
    format!("{ID_PREFIX}{}", hex::encode(&digest[..8]))
}
