//! Paired incremental hash state

use super::digest::{Digest256, DigestPair};
use sha2::{Digest, Sha256};

/// BLAKE3 and SHA-256 accumulators fed with the same bytes
///
/// Both absorb strictly in call order. SHA-256 has no chunk-independent
/// mode, so the accumulator must never be split across threads.
#[derive(Clone)]
pub struct DualAccumulator {
    blake3: blake3::Hasher,
    sha256: Sha256,
    bytes: u64,
}

impl DualAccumulator {
    /// Create fresh state
    pub fn new() -> Self {
        Self {
            blake3: blake3::Hasher::new(),
            sha256: Sha256::new(),
            bytes: 0,
        }
    }

    /// Absorb the next slice of the stream
    pub fn update(&mut self, data: &[u8]) {
        self.blake3.update(data);
        Digest::update(&mut self.sha256, data);
        self.bytes += data.len() as u64;
    }

    /// Bytes absorbed so far
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Finalize both digests
    pub fn finalize(self) -> DigestPair {
        let primary = Digest256::from_bytes(*self.blake3.finalize().as_bytes());
        let secondary = Digest256::from_bytes(self.sha256.finalize().into());
        DigestPair::new(primary, secondary, self.bytes)
    }
}

impl Default for DualAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Digest an in-memory buffer
pub fn hash_bytes(data: &[u8]) -> DigestPair {
    let mut acc = DualAccumulator::new();
    acc.update(data);
    acc.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::digest::{EMPTY_BLAKE3_HEX, EMPTY_SHA256_HEX};

    #[test]
    fn test_empty_input_known_digests() {
        let pair = DualAccumulator::new().finalize();
        assert_eq!(pair.primary_hex(), EMPTY_BLAKE3_HEX);
        assert_eq!(pair.secondary_hex(), EMPTY_SHA256_HEX);
        assert_eq!(pair.byte_count(), 0);
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut acc = DualAccumulator::new();
        acc.update(b"Hello, ");
        acc.update(b"");
        acc.update(b"FCCUR!");
        assert_eq!(acc.bytes(), 13);

        let incremental = acc.finalize();
        let direct = hash_bytes(b"Hello, FCCUR!");
        assert_eq!(incremental, direct);
        assert_eq!(
            direct.primary_hex(),
            blake3::hash(b"Hello, FCCUR!").to_hex().to_string()
        );
        assert_eq!(
            direct.secondary_hex(),
            hex::encode(Sha256::digest(b"Hello, FCCUR!"))
        );
    }
}
