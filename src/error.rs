//! Error types for DualDigest
//!
//! The four core variants (`SourceRead`, `SinkWrite`, `Cancelled`,
//! `InternalHashFault`) are what the hashing pipeline can surface. The
//! remaining variants belong to the file-level helpers and the CLI.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for DualDigest operations
#[derive(Error, Debug)]
pub enum DigestError {
    /// I/O failure reading the input stream
    #[error("Failed to read source stream: {0}")]
    SourceRead(#[source] std::io::Error),

    /// I/O failure writing the destination
    #[error("Failed to write destination: {0}")]
    SinkWrite(#[source] std::io::Error),

    /// External cancellation or timeout fired
    #[error("Operation cancelled: {0}")]
    Cancelled(CancelReason),

    /// Broken invariant inside the pipeline (conduit protocol violation,
    /// hashing task panic). Never expected in a correct build.
    #[error("Internal hash fault: {0}")]
    InternalHashFault(String),

    /// I/O error opening or preparing a file
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Malformed digest or checksum text
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    /// Content index could not be read or written
    #[error("Content index error: {0}")]
    IndexError(String),

    /// Recomputed digests differ from the expected ones
    #[error("Integrity check failed for '{path}': expected {expected}, got {actual}")]
    IntegrityMismatch {
        /// File that failed the check
        path: PathBuf,
        /// Expected digests
        expected: String,
        /// Recomputed digests
        actual: String,
    },
}

/// Why a session was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller tripped the cancellation token
    Requested,
    /// The session deadline passed
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => write!(f, "cancellation requested"),
            Self::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

impl DigestError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an integrity mismatch error
    pub fn integrity_mismatch(
        path: impl Into<PathBuf>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::IntegrityMismatch {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create an internal fault
    pub fn fault(message: impl Into<String>) -> Self {
        Self::InternalHashFault(message.into())
    }

    /// Check if this error came from cancellation or a timeout
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } | Self::IntegrityMismatch { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for DualDigest operations
pub type Result<T> = std::result::Result<T, DigestError>;

impl From<serde_json::Error> for DigestError {
    fn from(err: serde_json::Error) -> Self {
        DigestError::ConfigError(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| DigestError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = DigestError::io("/test/path", io_err);
        assert_eq!(err.path().unwrap(), &PathBuf::from("/test/path"));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_session_error_messages() {
        let sink = DigestError::SinkWrite(std::io::Error::other("disk full"));
        assert!(!sink.is_cancelled());
        assert!(sink.to_string().contains("disk full"));

        let cancelled = DigestError::Cancelled(CancelReason::DeadlineExceeded);
        assert!(cancelled.is_cancelled());
        assert_eq!(
            cancelled.to_string(),
            "Operation cancelled: deadline exceeded"
        );
    }

    #[test]
    fn test_with_path() {
        let res: std::io::Result<()> = Err(std::io::Error::other("boom"));
        let err = res.with_path("/tmp/x").unwrap_err();
        assert!(matches!(err, DigestError::Io { .. }));
    }
}
