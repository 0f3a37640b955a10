//! Configuration settings for DualDigest
//!
//! Defines the pipeline tuning knobs, their defaults, the JSON config file
//! format and the CLI arguments that override it.

use crate::error::{DigestError, IoResultExt, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Streams at or above this length are hashed with the chunked strategy (100 MiB)
pub const DEFAULT_PARALLEL_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Chunk size used by the chunked strategy (8 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Read buffer for the fan-out copy path (1 MiB)
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Buffers allowed in flight between the copy path and the hashing task
pub const DEFAULT_CONDUIT_DEPTH: usize = 4;

/// Largest accepted read buffer or chunk (1 GiB)
pub const MAX_BUFFER_SIZE: usize = 1024 * 1024 * 1024;

/// Largest accepted conduit depth
pub const MAX_CONDUIT_DEPTH: usize = 1024;

/// How often a producer blocked on a full conduit re-checks cancellation
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// DualDigest - single-pass copy-and-hash with BLAKE3 and SHA-256
#[derive(Parser, Debug, Clone)]
#[command(name = "dualdigest")]
#[command(author = "DualDigest Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Stream files to storage while computing BLAKE3 + SHA-256 content identities")]
#[command(long_about = r#"
DualDigest copies a byte stream to its destination and computes two
independent digests (BLAKE3 and SHA-256) over the same bytes in one pass.
The digest pair is the content identity used for duplicate detection and
integrity verification.

Examples:
  dualdigest hash upload.tar.gz                 # Print both digests
  dualdigest store upload.bin /srv/pkgs/a.bin   # Copy and hash in one pass
  dualdigest checksum *.iso --algorithm sha256  # sha256sum-style output
  dualdigest verify a.bin --blake3 <HEX>        # Integrity check
"#)]
pub struct CliArgs {
    /// JSON configuration file (CLI flags take precedence)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Read buffer size for the copy path (e.g., 1M, 256K)
    #[arg(short = 'b', long, global = true, value_name = "SIZE")]
    pub buffer_size: Option<String>,

    /// Chunk size for the chunked strategy (e.g., 8M)
    #[arg(long, global = true, value_name = "SIZE")]
    pub chunk_size: Option<String>,

    /// Minimum stream length for the chunked strategy (e.g., 100M)
    #[arg(long, global = true, value_name = "SIZE")]
    pub threshold: Option<String>,

    /// Buffers in flight between copy path and hashing task
    #[arg(long, global = true, value_name = "NUM")]
    pub conduit_depth: Option<usize>,

    /// Abort a session after this long (e.g., 30s, 5m)
    #[arg(long, global = true, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Show a progress bar
    #[arg(short = 'p', long, global = true)]
    pub progress: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compute the digest pair of one or more files
    #[command(name = "hash")]
    Hash {
        /// Files to hash
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Copy a file to a destination while hashing it
    #[command(name = "store")]
    Store {
        /// Source file
        source: PathBuf,
        /// Destination file (parent directories are created)
        destination: PathBuf,
    },

    /// Print checksum lines in sha256sum / b3sum format
    #[command(name = "checksum")]
    Checksum {
        /// Files to checksum
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Digest to print
        #[arg(long, value_enum, default_value = "blake3")]
        algorithm: HashAlgorithm,
        /// Write the checksum file here instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Verify a file against known digests
    #[command(name = "verify")]
    Verify {
        /// File to verify
        path: PathBuf,
        /// Expected BLAKE3 digest (64 hex chars)
        #[arg(long, value_name = "HEX")]
        blake3: String,
        /// Expected SHA-256 digest (64 hex chars)
        #[arg(long, value_name = "HEX")]
        sha256: Option<String>,
    },

    /// Compare sequential and chunked hashing throughput
    #[command(name = "benchmark")]
    Benchmark {
        /// Size of the in-memory test stream
        #[arg(long, default_value = "64M")]
        size: String,
    },
}

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Digest algorithm selector for checksum output
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE3 - the primary (tree-hash) digest
    #[default]
    #[value(name = "blake3")]
    Blake3,
    /// SHA-256 - the secondary (Merkle-Damgard) digest
    #[value(name = "sha256")]
    Sha256,
}

impl HashAlgorithm {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blake3 => "BLAKE3",
            Self::Sha256 => "SHA-256",
        }
    }
}

/// Strategy selection constants
///
/// Both values only affect throughput: every strategy produces the same
/// digests for the same bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Length hint at or above which the chunked strategy is used
    pub parallel_threshold: u64,
    /// Chunk size for the chunked strategy
    pub chunk_size: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl StrategyConfig {
    /// Check the values are usable
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(DigestError::config("chunk_size must be at least 1 byte"));
        }
        if self.chunk_size > MAX_BUFFER_SIZE {
            return Err(DigestError::config(format!(
                "chunk_size must not exceed {} bytes",
                MAX_BUFFER_SIZE
            )));
        }
        Ok(())
    }
}

/// Runtime configuration for the fan-out pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Strategy selection
    pub strategy: StrategyConfig,
    /// Read buffer size in bytes
    pub buffer_size: usize,
    /// Bounded conduit capacity, in buffers
    pub conduit_depth: usize,
    /// Cancellation poll interval while blocked on backpressure
    pub poll_interval_ms: u64,
    /// Optional per-session timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyConfig::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            conduit_depth: DEFAULT_CONDUIT_DEPTH,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: None,
        }
    }
}

impl PipelineConfig {
    /// Check the values are usable
    pub fn validate(&self) -> Result<()> {
        self.strategy.validate()?;
        if self.buffer_size == 0 {
            return Err(DigestError::config("buffer_size must be at least 1 byte"));
        }
        if self.buffer_size > MAX_BUFFER_SIZE {
            return Err(DigestError::config(format!(
                "buffer_size must not exceed {} bytes",
                MAX_BUFFER_SIZE
            )));
        }
        if self.conduit_depth == 0 {
            return Err(DigestError::config("conduit_depth must be at least 1"));
        }
        if self.conduit_depth > MAX_CONDUIT_DEPTH {
            return Err(DigestError::config(format!(
                "conduit_depth must not exceed {}",
                MAX_CONDUIT_DEPTH
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(DigestError::config("poll_interval_ms must be positive"));
        }
        Ok(())
    }

    /// Cancellation poll interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Session timeout, if configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).with_path(path)?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| DigestError::config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_path(path)?;
        Ok(())
    }

    /// Create config from CLI arguments, layered over the config file if given
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(size) = &args.buffer_size {
            config.buffer_size = parse_buffer_size(size)
                .map_err(|e| DigestError::config(format!("Invalid buffer size: {}", e)))?;
        }
        if let Some(size) = &args.chunk_size {
            config.strategy.chunk_size = parse_buffer_size(size)
                .map_err(|e| DigestError::config(format!("Invalid chunk size: {}", e)))?;
        }
        if let Some(size) = &args.threshold {
            config.strategy.parallel_threshold = parse_size(size)
                .map_err(|e| DigestError::config(format!("Invalid threshold: {}", e)))?;
        }
        if let Some(depth) = args.conduit_depth {
            config.conduit_depth = depth;
        }
        if let Some(timeout) = &args.timeout {
            let duration = humantime::parse_duration(timeout)
                .map_err(|e| DigestError::config(format!("Invalid timeout: {}", e)))?;
            config.timeout_ms = Some(duration.as_millis() as u64);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Parse human-readable size string to bytes
///
/// Accepts plain byte counts and `K`/`M`/`G`/`T` suffixes, optionally followed
/// by `B` or `iB`. All multipliers are binary.
pub fn parse_size(size: &str) -> std::result::Result<u64, String> {
    let size = size.trim().to_uppercase();

    if size.is_empty() {
        return Err("Empty size string".to_string());
    }

    let size = match size.strip_suffix("IB") {
        Some(prefix) => format!("{}B", prefix),
        None => size,
    };

    let (num_str, multiplier) = if size.ends_with("TB") || size.ends_with('T') {
        let num = size.trim_end_matches(|c| c == 'T' || c == 'B');
        (num, 1024u64 * 1024 * 1024 * 1024)
    } else if size.ends_with("GB") || size.ends_with('G') {
        let num = size.trim_end_matches(|c| c == 'G' || c == 'B');
        (num, 1024u64 * 1024 * 1024)
    } else if size.ends_with("MB") || size.ends_with('M') {
        let num = size.trim_end_matches(|c| c == 'M' || c == 'B');
        (num, 1024u64 * 1024)
    } else if size.ends_with("KB") || size.ends_with('K') {
        let num = size.trim_end_matches(|c| c == 'K' || c == 'B');
        (num, 1024u64)
    } else if size.ends_with('B') {
        let num = size.trim_end_matches('B');
        (num, 1u64)
    } else {
        (size.as_str(), 1u64)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {}", num_str))?;

    if !num.is_finite() {
        return Err(format!("Invalid number: {}", num_str));
    }
    if num < 0.0 {
        return Err(format!("Negative size: {}", num_str));
    }

    let bytes = num * multiplier as f64;
    if bytes >= u64::MAX as f64 {
        return Err(format!("Size too large: {}", size));
    }
    Ok(bytes as u64)
}

fn parse_buffer_size(size: &str) -> std::result::Result<usize, String> {
    let bytes = parse_size(size)?;
    usize::try_from(bytes).map_err(|_| format!("Size too large: {}", size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse_args(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert_eq!(parse_size("1K").unwrap(), 1024);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("8MiB").unwrap(), 8 * 1024 * 1024);
        assert_eq!(parse_size("100m").unwrap(), 100 * 1024 * 1024);
        assert_eq!(parse_size("1G").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size("1.5G").unwrap(), (1.5 * 1024.0 * 1024.0 * 1024.0) as u64);
        assert!(parse_size("").is_err());
        assert!(parse_size("lots").is_err());
        assert!(parse_size("-4K").is_err());
    }

    #[test]
    fn test_parse_size_rejects_non_finite() {
        assert!(parse_size("inf").is_err());
        assert!(parse_size("infinity").is_err());
        assert!(parse_size("NaN").is_err());
        assert!(parse_size("1e30T").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.strategy.parallel_threshold, 100 * 1024 * 1024);
        assert_eq!(config.strategy.chunk_size, 8 * 1024 * 1024);
        assert!(config.validate().is_ok());
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = PipelineConfig::default();
        config.strategy.chunk_size = 0;
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            conduit_depth: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_oversized_buffers() {
        let config = PipelineConfig {
            buffer_size: usize::MAX,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DigestError::ConfigError(_))));

        let mut config = PipelineConfig::default();
        config.strategy.chunk_size = MAX_BUFFER_SIZE + 1;
        assert!(config.validate().is_err());
        config.strategy.chunk_size = MAX_BUFFER_SIZE;
        assert!(config.validate().is_ok());

        let config = PipelineConfig {
            conduit_depth: usize::MAX,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let args = parse_args(&["dualdigest", "--buffer-size", "inf", "hash", "a.bin"]);
        assert!(matches!(
            PipelineConfig::from_cli(&args),
            Err(DigestError::ConfigError(_))
        ));

        let args = parse_args(&["dualdigest", "--chunk-size", "1T", "hash", "a.bin"]);
        assert!(PipelineConfig::from_cli(&args).is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let args = parse_args(&[
            "dualdigest",
            "--chunk-size",
            "4M",
            "--threshold",
            "64M",
            "--timeout",
            "30s",
            "hash",
            "a.bin",
        ]);
        let config = PipelineConfig::from_cli(&args).unwrap();
        assert_eq!(config.strategy.chunk_size, 4 * 1024 * 1024);
        assert_eq!(config.strategy.parallel_threshold, 64 * 1024 * 1024);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn test_cli_rejects_bad_timeout() {
        let args = parse_args(&["dualdigest", "--timeout", "soon", "hash", "a.bin"]);
        assert!(PipelineConfig::from_cli(&args).is_err());
    }

    #[test]
    fn test_config_file_roundtrip_with_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dualdigest.json");
        std::fs::write(&path, r#"{ "conduit_depth": 8, "strategy": { "chunk_size": 1048576 } }"#)
            .unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.conduit_depth, 8);
        assert_eq!(config.strategy.chunk_size, 1024 * 1024);
        assert_eq!(config.strategy.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);

        let args = parse_args(&[
            "dualdigest",
            "--config",
            path.to_str().unwrap(),
            "--conduit-depth",
            "2",
            "hash",
            "a.bin",
        ]);
        let config = PipelineConfig::from_cli(&args).unwrap();
        assert_eq!(config.conduit_depth, 2);
        assert_eq!(config.strategy.chunk_size, 1024 * 1024);
    }

    #[test]
    fn test_hash_algorithm() {
        assert_eq!(HashAlgorithm::Blake3.name(), "BLAKE3");
        assert_eq!(HashAlgorithm::Sha256.name(), "SHA-256");
        assert_eq!(HashAlgorithm::default(), HashAlgorithm::Blake3);
    }
}
