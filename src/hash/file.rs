//! File-level hashing and verification

use super::digest::{Digest256, DigestPair};
use crate::error::{DigestError, IoResultExt, Result};
use crate::pipeline::FanOutPipeline;
use crate::progress::ProgressReporter;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// What a file is expected to hash to
///
/// Only the BLAKE3 digest is mandatory; the SHA-256 digest and length are
/// checked when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedDigests {
    /// Expected BLAKE3 digest
    pub primary: Digest256,
    /// Expected SHA-256 digest
    pub secondary: Option<Digest256>,
    /// Expected length in bytes
    pub byte_count: Option<u64>,
}

impl ExpectedDigests {
    /// Expect a BLAKE3 digest only
    pub fn primary(primary: Digest256) -> Self {
        Self {
            primary,
            secondary: None,
            byte_count: None,
        }
    }

    /// Check an actual pair against the expectation
    pub fn matches(&self, actual: &DigestPair) -> bool {
        self.primary == *actual.primary()
            && self.secondary.map_or(true, |s| s == *actual.secondary())
            && self.byte_count.map_or(true, |n| n == actual.byte_count())
    }
}

impl From<DigestPair> for ExpectedDigests {
    fn from(pair: DigestPair) -> Self {
        Self {
            primary: *pair.primary(),
            secondary: Some(*pair.secondary()),
            byte_count: Some(pair.byte_count()),
        }
    }
}

/// Hash a file, using its length as the strategy hint
pub fn hash_file(pipeline: &FanOutPipeline, path: &Path) -> Result<DigestPair> {
    hash_file_with_progress(pipeline, path, None)
}

/// Hash a file and report progress
pub fn hash_file_with_progress(
    pipeline: &FanOutPipeline,
    path: &Path,
    progress: Option<&mut dyn ProgressReporter>,
) -> Result<DigestPair> {
    let file = File::open(path).with_path(path)?;
    let size = file.metadata().with_path(path)?.len();
    pipeline.hash_with_hint(file, Some(size), progress)
}

/// Hash independent files in parallel, one task per file
///
/// Results come back in input order.
pub fn hash_files_parallel<P>(pipeline: &FanOutPipeline, paths: &[P]) -> Vec<Result<DigestPair>>
where
    P: AsRef<Path> + Sync,
{
    paths
        .par_iter()
        .map(|path| hash_file(pipeline, path.as_ref()))
        .collect()
}

/// Recompute a file's digests and compare them with `expected`
///
/// Returns the actual pair on success and `IntegrityMismatch` otherwise.
pub fn verify_file(
    pipeline: &FanOutPipeline,
    path: &Path,
    expected: &ExpectedDigests,
) -> Result<DigestPair> {
    let actual = hash_file(pipeline, path)?;

    if expected.matches(&actual) {
        tracing::debug!(path = %path.display(), "Integrity check passed");
        return Ok(actual);
    }

    let expected_text = match expected.secondary {
        Some(secondary) => format!("blake3:{} sha256:{}", expected.primary, secondary),
        None => format!("blake3:{}", expected.primary),
    };
    let expected_text = match expected.byte_count {
        Some(n) => format!("{} ({} bytes)", expected_text, n),
        None => expected_text,
    };

    Err(DigestError::integrity_mismatch(
        path,
        expected_text,
        actual.to_string(),
    ))
}
