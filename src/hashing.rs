//! Content hashing for change detection.
//!
//! Two fingerprints are computed per snapshot: a SHA-256 digest over the
//! exact text (the identity hash used for the fast equality path) and a
//! cheaper XXH3 digest over sorted character shingles that is insensitive to
//! reordering and whitespace (a secondary "roughly the same content" signal).

use sha2::{Digest, Sha256};
use xxhash_rust::xxh3::xxh3_64;

/// Width of the character shingles fed into the similarity digest.
const SHINGLE_SIZE: usize = 3;

/// SHA-256 hex digest of the content, byte-for-byte.
#[must_use]
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Order-insensitive similarity fingerprint.
///
/// The text is lowercased and whitespace-collapsed, split into overlapping
/// three-character shingles, and the sorted, deduplicated shingle set is
/// digested. Only equality of two fingerprints is meaningful.
#[must_use]
pub fn similarity_hash(content: &str) -> String {
    let normalized = content
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let chars: Vec<char> = normalized.chars().collect();
    if chars.len() < SHINGLE_SIZE {
        return format!("{:016x}", xxh3_64(normalized.as_bytes()));
    }

    let mut shingles: Vec<String> = chars
        .windows(SHINGLE_SIZE)
        .map(|window| window.iter().collect())
        .collect();
    shingles.sort_unstable();
    shingles.dedup();

    format!("{:016x}", xxh3_64(shingles.concat().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(hash_content("hello"), hash_content("hello"));
        assert_ne!(hash_content("hello"), hash_content("hello!"));
    }

    #[test]
    fn content_hash_is_sha256_hex() {
        let digest = hash_content("");
        assert_eq!(digest.len(), 64);
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn similarity_ignores_case_and_whitespace() {
        let a = similarity_hash("Hello   World");
        let b = similarity_hash("hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn similarity_differs_for_different_text() {
        assert_ne!(
            similarity_hash("a completely different page"),
            similarity_hash("nothing in common here at all")
        );
    }

    #[test]
    fn short_inputs_do_not_panic() {
        let _ = similarity_hash("");
        let _ = similarity_hash("ab");
    }
}
