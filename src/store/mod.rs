//! Content storage
//!
//! Persists uploads through the fan-out pipeline and keeps the resulting
//! content records for duplicate detection.

mod persist;
mod record;

pub use crate::hash::is_valid_content_key;
pub use persist::{persist_file, persist_file_async};
pub use record::{ContentIndex, ContentRecord, InsertOutcome};
