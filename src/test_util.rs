//! Deterministic streams and faulty endpoints for unit tests

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Pseudo-random stream of a fixed length, generated on the fly
///
/// Byte `i` depends only on the seed and `i`, so the stream is identical
/// however it is read.
pub struct PatternReader {
    seed: u64,
    pos: u64,
    len: u64,
    word_index: u64,
    word: u64,
}

impl PatternReader {
    pub fn new(len: u64, seed: u64) -> Self {
        Self {
            seed,
            pos: 0,
            len,
            word_index: u64::MAX,
            word: 0,
        }
    }
}

impl Read for PatternReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = (self.len - self.pos).min(buf.len() as u64) as usize;
        for slot in &mut buf[..remaining] {
            let index = self.pos / 8;
            if index != self.word_index {
                self.word_index = index;
                self.word = splitmix64(self.seed.rotate_left(32) ^ index);
            }
            *slot = (self.word >> ((self.pos % 8) * 8)) as u8;
            self.pos += 1;
        }
        Ok(remaining)
    }
}

/// Materialize a [`PatternReader`] stream
pub fn pseudo_random(len: usize, seed: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(len);
    PatternReader::new(len as u64, seed)
        .read_to_end(&mut data)
        .unwrap();
    data
}

/// Yields its data, then fails once `fail_after` bytes have been read
pub struct FailingReader {
    data: Vec<u8>,
    pos: usize,
    fail_after: usize,
}

impl FailingReader {
    pub fn new(data: Vec<u8>, fail_after: usize) -> Self {
        Self {
            data,
            pos: 0,
            fail_after,
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.fail_after {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "source dropped"));
        }
        let end = self.data.len().min(self.fail_after).min(self.pos + buf.len());
        let n = end - self.pos;
        buf[..n].copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(n)
    }
}

/// Returns `Interrupted` before every successful read
pub struct InterruptingReader<R> {
    inner: R,
    interrupt_next: bool,
}

impl<R> InterruptingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            interrupt_next: true,
        }
    }
}

impl<R: Read> Read for InterruptingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.interrupt_next {
            self.interrupt_next = false;
            return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
        }
        self.interrupt_next = true;
        self.inner.read(buf)
    }
}

/// Sink that accepts `limit` bytes and then fails every write
pub struct FailingWriter {
    limit: u64,
    accepted: Arc<AtomicU64>,
}

impl FailingWriter {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            accepted: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Handle to the accepted byte count, readable after the writer moves
    pub fn accepted(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.accepted)
    }
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let accepted = self.accepted.load(Ordering::SeqCst);
        if accepted >= self.limit {
            return Err(io::Error::other("disk full"));
        }
        let n = (self.limit - accepted).min(buf.len() as u64);
        self.accepted.fetch_add(n, Ordering::SeqCst);
        Ok(n as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink whose `flush` always fails
pub struct FlushFailingWriter(pub Vec<u8>);

impl Write for FlushFailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "flush failed"))
    }
}

#[test]
fn pattern_reader_is_read_size_independent() {
    let whole = pseudo_random(1000, 5);
    let mut pieces = Vec::new();
    let mut reader = PatternReader::new(1000, 5);
    let mut buf = [0u8; 13];
    loop {
        let n = reader.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        pieces.extend_from_slice(&buf[..n]);
    }
    assert_eq!(whole, pieces);
    assert_ne!(whole, pseudo_random(1000, 6));
}
