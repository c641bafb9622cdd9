//! Content digests for cached images.

/// Compute the BLAKE3 digest of the given bytes as lowercase hexadecimal.
///
/// The digest is the cache's identity for an image: two downloads with the
/// same bytes produce the same digest regardless of where they came from or
/// what metadata accompanies them. The output is always 64 hex characters.
pub fn digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
