/// Computes content checksums for file data.
pub trait ContentHasher {
    /// Returns the digest of `data` as a fixed-length lowercase hex string.
    fn hex_digest(&self, data: &[u8]) -> String;
}

/// BLAKE3 content checksums (64 hex characters).
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3Hasher;

impl ContentHasher for Blake3Hasher {
    fn hex_digest(&self, data: &[u8]) -> String {
        blake3::hash(data).to_hex().to_string()
    }
}
