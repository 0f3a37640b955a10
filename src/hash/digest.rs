//! Digest value types
//!
//! A [`DigestPair`] is the content identity of a stream: a BLAKE3 digest
//! (primary), a SHA-256 digest (secondary) and the exact byte count.

use crate::config::HashAlgorithm;
use crate::error::{DigestError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Length of each digest in bytes
pub const DIGEST_LEN: usize = 32;

/// Length of each digest rendered as hex
pub const DIGEST_HEX_LEN: usize = DIGEST_LEN * 2;

/// BLAKE3 of the empty input
pub const EMPTY_BLAKE3_HEX: &str =
    "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262";

/// SHA-256 of the empty input
pub const EMPTY_SHA256_HEX: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// A 256-bit digest
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest256([u8; DIGEST_LEN]);

impl Digest256 {
    /// Wrap raw digest bytes
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex, always 64 characters
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse 64 hex characters (either case)
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != DIGEST_HEX_LEN {
            return Err(DigestError::InvalidDigest(format!(
                "expected {} hex chars, got {}",
                DIGEST_HEX_LEN,
                s.len()
            )));
        }
        let mut bytes = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| DigestError::InvalidDigest(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Digest256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest256({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Digest256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Digest256 {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Digest256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Content identity of a stream
///
/// Identical bytes always give an identical pair, whichever strategy,
/// chunk size or buffer size produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DigestPair {
    #[serde(rename = "blake3")]
    primary: Digest256,
    #[serde(rename = "sha256")]
    secondary: Digest256,
    byte_count: u64,
}

impl DigestPair {
    /// Assemble a pair from finished digests
    pub fn new(primary: Digest256, secondary: Digest256, byte_count: u64) -> Self {
        Self {
            primary,
            secondary,
            byte_count,
        }
    }

    /// Parse a pair from its hex rendering
    pub fn from_hex(primary: &str, secondary: &str, byte_count: u64) -> Result<Self> {
        Ok(Self::new(
            Digest256::from_hex(primary)?,
            Digest256::from_hex(secondary)?,
            byte_count,
        ))
    }

    /// BLAKE3 digest
    pub fn primary(&self) -> &Digest256 {
        &self.primary
    }

    /// SHA-256 digest
    pub fn secondary(&self) -> &Digest256 {
        &self.secondary
    }

    /// Number of bytes hashed
    pub fn byte_count(&self) -> u64 {
        self.byte_count
    }

    /// BLAKE3 digest as lowercase hex
    pub fn primary_hex(&self) -> String {
        self.primary.to_hex()
    }

    /// SHA-256 digest as lowercase hex
    pub fn secondary_hex(&self) -> String {
        self.secondary.to_hex()
    }

    /// Digest for the given algorithm
    pub fn get(&self, algorithm: HashAlgorithm) -> &Digest256 {
        match algorithm {
            HashAlgorithm::Blake3 => &self.primary,
            HashAlgorithm::Sha256 => &self.secondary,
        }
    }

    /// Exact-match lookup key for duplicate detection
    pub fn content_key(&self) -> String {
        self.primary_hex()
    }
}

impl fmt::Display for DigestPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "blake3:{} sha256:{} ({} bytes)",
            self.primary, self.secondary, self.byte_count
        )
    }
}

/// Check a string is usable as a content lookup key (64 hex characters)
pub fn is_valid_content_key(key: &str) -> bool {
    key.len() == DIGEST_HEX_LEN && key.bytes().all(|b| b.is_ascii_hexdigit())
}
