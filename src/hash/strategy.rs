//! Strategy selection

use super::chunked::ChunkedDualHasher;
use super::digest::DigestPair;
use super::sequential::SequentialDualHasher;
use crate::config::StrategyConfig;
use crate::error::Result;
use crate::progress::ProgressReporter;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// How a session hashes its stream; fixed for the whole session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum HashStrategy {
    /// One linear pass, progress per slice
    Sequential,
    /// Fixed-size chunks absorbed in order, progress per chunk
    Chunked {
        /// Chunk size in bytes
        chunk_size: usize,
    },
}

impl HashStrategy {
    /// Hash a stream with this strategy
    ///
    /// The chunked strategy uses `length_hint` to skip its chunk buffer
    /// for streams shorter than one chunk.
    pub fn hash_reader<R: Read>(
        &self,
        reader: R,
        length_hint: Option<u64>,
        progress: Option<&mut dyn ProgressReporter>,
    ) -> Result<DigestPair> {
        match *self {
            Self::Sequential => SequentialDualHasher::new().hash_reader(reader, progress),
            Self::Chunked { chunk_size } => {
                ChunkedDualHasher::new(chunk_size).hash_with_hint(reader, length_hint, progress)
            }
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Chunked { .. } => "chunked",
        }
    }
}

/// Picks a [`HashStrategy`] from a stream length hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategySelector {
    config: StrategyConfig,
}

impl StrategySelector {
    /// Create a selector from validated constants
    pub fn new(config: StrategyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Constants this selector was built with
    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Unknown or below-threshold lengths hash sequentially
    pub fn select(&self, length_hint: Option<u64>) -> HashStrategy {
        match length_hint {
            Some(len) if len >= self.config.parallel_threshold => HashStrategy::Chunked {
                chunk_size: self.config.chunk_size,
            },
            _ => HashStrategy::Sequential,
        }
    }
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self {
            config: StrategyConfig::default(),
        }
    }
}
