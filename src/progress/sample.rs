//! Progress callback contract shared by both hashing strategies

/// Cumulative byte count reported during one hashing session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProgressSample {
    /// Bytes absorbed by the digest accumulators so far
    pub bytes_processed: u64,
}

impl ProgressSample {
    /// Create a sample
    pub fn new(bytes_processed: u64) -> Self {
        Self { bytes_processed }
    }
}

/// Receiver of progress samples
///
/// Samples delivered within one session are non-decreasing. The sequential
/// strategy reports after every slice it reads, the chunked strategy once per
/// chunk. Reporters run on the hashing task's thread, hence `Send`.
pub trait ProgressReporter: Send {
    /// Called with the cumulative byte count
    fn report(&mut self, sample: ProgressSample);
}

impl<F> ProgressReporter for F
where
    F: FnMut(ProgressSample) + Send,
{
    fn report(&mut self, sample: ProgressSample) {
        self(sample)
    }
}

/// Running byte total that forwards to an optional reporter
pub(crate) struct ProgressTracker<'a> {
    reporter: Option<&'a mut dyn ProgressReporter>,
    bytes: u64,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(reporter: Option<&'a mut dyn ProgressReporter>) -> Self {
        Self { reporter, bytes: 0 }
    }

    /// Account for `n` more bytes and emit a sample
    pub(crate) fn advance(&mut self, n: usize) {
        self.bytes += n as u64;
        if let Some(reporter) = self.reporter.as_mut() {
            reporter.report(ProgressSample::new(self.bytes));
        }
    }

    pub(crate) fn bytes(&self) -> u64 {
        self.bytes
    }
}
