//! Fan-out copy-and-hash pipeline
//!
//! One session copies a source into a sink while a hashing task digests
//! the same bytes. The two sides are joined by a bounded conduit so a
//! slow hasher throttles the copy and vice versa.

mod cancel;
mod conduit;
mod fanout;

pub use cancel::CancellationToken;
pub use fanout::{hash_and_persist, hash_reader, FanOutPipeline, PersistOutcome};
