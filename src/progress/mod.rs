//! Progress reporting module
//!
//! Defines the callback contract the hashers report through, plus
//! ready-made reporters for terminals and log output.

mod reporter;
mod sample;

pub use reporter::*;
pub use sample::{ProgressReporter, ProgressSample};

pub(crate) use sample::ProgressTracker;
