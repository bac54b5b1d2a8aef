//! # Content Hashing
//!
//! Uses SHA-256 to compute the content address of blobs. The hash is the
//! key into the [`crate::store::BlobStore`] — two files with identical
//! bytes produce the same hash and are stored only once.

use sha2::{Digest, Sha256};

/// Size of the chunk used when feeding large in-memory slices to the
/// hasher incrementally rather than in one call. Chosen to balance
/// overhead against memory pressure; purely an implementation detail, the
/// resulting digest is identical to hashing the slice in one shot.
const CHUNK_SIZE: usize = 64 * 1024;

/// Computes the SHA-256 hash of a byte slice, returning a lowercase hex
/// digest.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    for chunk in data.chunks(CHUNK_SIZE.max(1)) {
        hasher.update(chunk);
    }
    hex::encode(hasher.finalize())
}

/// Formats a hex digest as a content reference: `blobs/sha256-<hex>`.
pub fn content_ref(hex_digest: &str) -> String {
    format!("blobs/sha256-{hex_digest}")
}

/// Extracts the hex digest from a content reference of the form
/// `blobs/sha256-<hex>` (a leading `.store/` prefix, if present, is
/// stripped first). Returns `None` if the reference is not well-formed.
pub fn digest_from_content_ref(content_ref: &str) -> Option<&str> {
    let stripped = content_ref.strip_prefix(".store/").unwrap_or(content_ref);
    stripped.strip_prefix("blobs/sha256-")
}

/// Returns the first `n` characters of a hash for display purposes.
pub fn short_hash(hash: &str, n: usize) -> &str {
    &hash[..n.min(hash.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_bytes_consistent() {
        let h1 = hash_bytes(b"test data");
        let h2 = hash_bytes(b"test data");
        assert_eq!(h1, h2);
    }

    #[test]
    fn hash_bytes_different_inputs() {
        let h1 = hash_bytes(b"data A");
        let h2 = hash_bytes(b"data B");
        assert_ne!(h1, h2);
    }

    #[test]
    fn hash_is_lowercase_hex_64_chars() {
        let h = hash_bytes(b"hello world");
        assert_eq!(h.len(), 64);
        assert!(h
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn content_ref_format_and_roundtrip() {
        let h = hash_bytes(b"hello world");
        let r = content_ref(&h);
        assert!(r.starts_with("blobs/sha256-"));
        assert_eq!(digest_from_content_ref(&r), Some(h.as_str()));
    }

    #[test]
    fn digest_from_content_ref_strips_store_prefix() {
        let h = hash_bytes(b"x");
        let r = format!(".store/blobs/sha256-{h}");
        assert_eq!(digest_from_content_ref(&r), Some(h.as_str()));
    }

    #[test]
    fn digest_from_content_ref_rejects_malformed() {
        assert_eq!(digest_from_content_ref("not-a-ref"), None);
    }

    #[test]
    fn hash_large_buffer_matches_single_shot() {
        let data = vec![0x42u8; CHUNK_SIZE * 3 + 17];
        let via_chunks = hash_bytes(&data);
        let mut hasher = Sha256::new();
        hasher.update(&data);
        let direct = hex::encode(hasher.finalize());
        assert_eq!(via_chunks, direct);
    }

    #[test]
    fn short_hash_truncates() {
        let hash = "abcdefghij";
        assert_eq!(short_hash(hash, 4), "abcd");
    }
}
