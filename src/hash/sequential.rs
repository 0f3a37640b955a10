//! Single linear pass over a stream

use super::accumulator::DualAccumulator;
use super::digest::DigestPair;
use crate::error::{DigestError, Result};
use crate::progress::{ProgressReporter, ProgressTracker};
use std::io::{ErrorKind, Read};

/// Read buffer used when no size is given (64 KiB)
pub const DEFAULT_READ_BUFFER: usize = 64 * 1024;

/// Hashes a stream with both algorithms in one pass
///
/// Progress is reported after every slice read from the source.
#[derive(Debug, Clone, Copy)]
pub struct SequentialDualHasher {
    buffer_size: usize,
}

impl SequentialDualHasher {
    /// Create a hasher with the default read buffer
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_READ_BUFFER)
    }

    /// Create a hasher with a custom read buffer (minimum 1 byte)
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Read buffer size
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Hash everything `reader` yields until end of stream
    pub fn hash_reader<R: Read>(
        &self,
        mut reader: R,
        progress: Option<&mut dyn ProgressReporter>,
    ) -> Result<DigestPair> {
        let mut acc = DualAccumulator::new();
        let mut tracker = ProgressTracker::new(progress);
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            let bytes_read = read_retrying(&mut reader, &mut buffer)?;
            if bytes_read == 0 {
                break;
            }

            acc.update(&buffer[..bytes_read]);
            tracker.advance(bytes_read);
        }

        debug_assert_eq!(acc.bytes(), tracker.bytes());
        Ok(acc.finalize())
    }

    /// Hash a sequence of slices as if they were one stream
    pub fn hash_slices<'a, I>(&self, slices: I, progress: Option<&mut dyn ProgressReporter>) -> DigestPair
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut acc = DualAccumulator::new();
        let mut tracker = ProgressTracker::new(progress);

        for slice in slices {
            acc.update(slice);
            tracker.advance(slice.len());
        }

        acc.finalize()
    }
}

impl Default for SequentialDualHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// One `read` call, retried on `Interrupted`
pub(crate) fn read_retrying<R: Read + ?Sized>(reader: &mut R, buffer: &mut [u8]) -> Result<usize> {
    loop {
        match reader.read(buffer) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(DigestError::SourceRead(e)),
        }
    }
}
