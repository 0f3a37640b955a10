//! # DualDigest - Single-Pass Copy-and-Hash
//!
//! DualDigest streams bytes to a destination while computing two
//! independent content digests over exactly the same bytes: BLAKE3
//! (primary) and SHA-256 (secondary). The resulting [`DigestPair`] is the
//! content identity used for duplicate detection and integrity checks.
//!
//! ## Features
//!
//! - **One pass**: the destination write and both digests share a single read
//! - **Deterministic**: sequential and chunked strategies give identical digests
//! - **Backpressure**: a bounded conduit caps memory whatever the stream length
//! - **Fail fast**: the first failure on either side ends the session
//! - **Cancellation**: shared token with optional deadline
//!
//! ## Quick Start
//!
//! ```no_run
//! use dualdigest::hash_reader;
//! use std::fs::File;
//!
//! let digests = hash_reader(File::open("upload.bin").unwrap()).unwrap();
//! println!("blake3 {}", digests.primary_hex());
//! println!("sha256 {}", digests.secondary_hex());
//! ```
//!
//! ## Copy and Hash
//!
//! ```no_run
//! use dualdigest::config::PipelineConfig;
//! use dualdigest::pipeline::{CancellationToken, FanOutPipeline};
//! use std::fs::File;
//!
//! let pipeline = FanOutPipeline::new(PipelineConfig::default()).unwrap();
//! let source = File::open("upload.bin").unwrap();
//! let length = source.metadata().unwrap().len();
//! let sink = File::create("/srv/store/upload.bin").unwrap();
//!
//! let outcome = pipeline
//!     .hash_and_persist(source, sink, Some(length), None, &CancellationToken::new())
//!     .unwrap();
//!
//! println!("{} bytes, {}", outcome.bytes_written, outcome.digests);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod hash;
pub mod pipeline;
pub mod progress;
pub mod store;

#[cfg(test)]
mod test_util;

// Re-export commonly used types
pub use config::{HashAlgorithm, PipelineConfig, StrategyConfig};
pub use error::{CancelReason, DigestError, Result};
pub use hash::{Digest256, DigestPair, HashStrategy};
pub use pipeline::{hash_and_persist, hash_reader, CancellationToken, FanOutPipeline, PersistOutcome};
pub use progress::{ProgressReporter, ProgressSample};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use dualdigest::prelude::*;
    //! ```

    pub use crate::config::{HashAlgorithm, PipelineConfig, StrategyConfig};
    pub use crate::error::{DigestError, Result};
    pub use crate::hash::{
        hash_bytes, hash_file, verify_file, Digest256, DigestPair, ExpectedDigests, HashStrategy,
        StrategySelector,
    };
    pub use crate::pipeline::{CancellationToken, FanOutPipeline, PersistOutcome};
    pub use crate::progress::{LogReporter, ProgressBarReporter, ProgressReporter, ProgressSample};
    pub use crate::store::{persist_file, ContentIndex, ContentRecord};
}
