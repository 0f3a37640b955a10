//! Cooperative cancellation

use crate::error::{CancelReason, DigestError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared cancellation flag with an optional deadline
///
/// Clones share the flag, so cancelling any clone cancels every session
/// holding one. The pipeline checks the token before each read and while
/// blocked on a full conduit.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    /// Create a token that never fires on its own
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token that fires once `timeout` has elapsed
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline_after(timeout)
    }

    /// Same flag, with a deadline no later than `timeout` from now
    pub fn deadline_after(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: Some(deadline),
        }
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation was requested (ignores the deadline)
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the token has fired, if it has
    pub fn reason(&self) -> Option<CancelReason> {
        if self.is_cancelled() {
            return Some(CancelReason::Requested);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    /// `Err(Cancelled)` once the token has fired
    pub fn check(&self) -> Result<()> {
        match self.reason() {
            Some(reason) => Err(DigestError::Cancelled(reason)),
            None => Ok(()),
        }
    }
}
