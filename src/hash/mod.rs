//! Dual-digest hashing
//!
//! Every hasher here feeds the same bytes, in order, to a BLAKE3 and a
//! SHA-256 accumulator and returns both digests with the byte count.
//! Which hasher runs only changes throughput, never the result.

mod accumulator;
mod checksum;
mod chunked;
mod digest;
mod file;
mod sequential;
mod strategy;

pub use accumulator::{hash_bytes, DualAccumulator};
pub use checksum::*;
pub use chunked::ChunkedDualHasher;
pub use digest::*;
pub use file::*;
pub(crate) use sequential::read_retrying;
pub use sequential::{SequentialDualHasher, DEFAULT_READ_BUFFER};
pub use strategy::{HashStrategy, StrategySelector};
