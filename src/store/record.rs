//! Content records and the duplicate index

use crate::error::{DigestError, IoResultExt, Result};
use crate::hash::{is_valid_content_key, DigestPair};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A persisted upload and its content identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Upload name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// BLAKE3 + SHA-256 identity of the stored bytes
    pub digests: DigestPair,
    /// When the bytes were persisted
    pub stored_at: DateTime<Utc>,
}

impl ContentRecord {
    /// Create a record stamped with the current time
    pub fn new(name: impl Into<String>, digests: DigestPair) -> Self {
        Self {
            name: name.into(),
            size: digests.byte_count(),
            digests,
            stored_at: Utc::now(),
        }
    }

    /// Duplicate lookup key (BLAKE3 hex)
    pub fn content_key(&self) -> String {
        self.digests.content_key()
    }
}

/// In-memory index of records keyed by content
///
/// Lookups are exact matches on the BLAKE3 digest; records whose SHA-256
/// digest or length disagree under the same key are reported as
/// conflicts instead of duplicates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentIndex {
    records: HashMap<String, ContentRecord>,
}

/// What happened when a record was offered to the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// New content, record stored
    Inserted,
    /// Same content already present under this record
    Duplicate(ContentRecord),
}

impl ContentIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a record unless identical content is already indexed
    pub fn insert(&mut self, record: ContentRecord) -> Result<InsertOutcome> {
        let key = record.content_key();
        match self.records.get(&key) {
            Some(existing) if existing.digests == record.digests => {
                tracing::debug!(key = %key, name = %existing.name, "Duplicate content");
                Ok(InsertOutcome::Duplicate(existing.clone()))
            }
            Some(existing) => Err(DigestError::integrity_mismatch(
                record.name.as_str(),
                existing.digests.to_string(),
                record.digests.to_string(),
            )),
            None => {
                self.records.insert(key, record);
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    /// Look up a record by its 64-character hex key
    pub fn find(&self, key: &str) -> Result<Option<&ContentRecord>> {
        if !is_valid_content_key(key) {
            return Err(DigestError::InvalidDigest(format!(
                "content key must be 64 hex characters, got {:?}",
                key
            )));
        }
        Ok(self.records.get(&key.to_ascii_lowercase()))
    }

    /// Iterate over all records
    pub fn records(&self) -> impl Iterator<Item = &ContentRecord> {
        self.records.values()
    }

    /// Save the index as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DigestError::IndexError(e.to_string()))?;
        std::fs::write(path, json).with_path(path)?;
        Ok(())
    }

    /// Load an index saved with [`ContentIndex::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        serde_json::from_str(&content).map_err(|e| DigestError::IndexError(e.to_string()))
    }
}
