//! Bounded channel between the copy path and the hashing task
//!
//! Frames are shared read-only [`Bytes`] views; sending one moves a
//! reference count, never the bytes. A full channel blocks the sender,
//! an empty open channel blocks the reader, and a dropped sender reads as
//! end of stream.

use super::cancel::CancellationToken;
use crate::error::Result;
use bytes::{Buf, Bytes};
use crossbeam::channel::{bounded, Receiver, SendTimeoutError, Sender};
use std::io::{self, Read};
use std::time::Duration;

/// Create a conduit holding at most `depth` frames in flight
pub(crate) fn conduit(depth: usize) -> (ConduitSender, ConduitReader) {
    let (tx, rx) = bounded(depth.max(1));
    (
        ConduitSender { tx },
        ConduitReader {
            rx,
            current: Bytes::new(),
        },
    )
}

/// Producer half of the conduit
pub(crate) struct ConduitSender {
    tx: Sender<Bytes>,
}

impl ConduitSender {
    /// Send one frame, blocking while the conduit is full
    ///
    /// While blocked the cancellation token is re-checked every
    /// `poll_interval`. Returns `Ok(false)` if the reader is gone.
    pub(crate) fn send(
        &self,
        mut frame: Bytes,
        cancel: &CancellationToken,
        poll_interval: Duration,
    ) -> Result<bool> {
        loop {
            match self.tx.send_timeout(frame, poll_interval) {
                Ok(()) => return Ok(true),
                Err(SendTimeoutError::Timeout(returned)) => {
                    cancel.check()?;
                    frame = returned;
                }
                Err(SendTimeoutError::Disconnected(_)) => return Ok(false),
            }
        }
    }
}

/// Consumer half of the conduit, readable as a plain byte stream
pub(crate) struct ConduitReader {
    rx: Receiver<Bytes>,
    current: Bytes,
}

impl Read for ConduitReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while !self.current.has_remaining() {
            match self.rx.recv() {
                Ok(frame) => self.current = frame,
                Err(_) => return Ok(0),
            }
        }

        let n = self.current.remaining().min(buf.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current.advance(n);
        Ok(n)
    }
}
