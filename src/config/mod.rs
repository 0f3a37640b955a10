//! Configuration module for DualDigest
//!
//! Provides configuration management including CLI arguments,
//! config files, and pipeline tuning defaults.

mod settings;

pub use settings::*;
