//! Single-pass copy-and-hash
//!
//! The calling thread reads the source, hands each buffer to a hashing
//! task over a bounded conduit and writes the same buffer to the sink.
//! The hashing task runs on a scoped thread and reads the conduit as an
//! ordinary stream, so the chosen strategy never knows a sink exists.

use super::cancel::CancellationToken;
use super::conduit::{conduit, ConduitSender};
use crate::config::PipelineConfig;
use crate::error::{DigestError, Result};
use crate::hash::{read_retrying, DigestPair, HashStrategy, StrategySelector};
use crate::progress::ProgressReporter;
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::io::{Read, Write};
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;

/// Result of a successful copy-and-hash session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistOutcome {
    /// Content identity of the bytes written
    pub digests: DigestPair,
    /// Bytes written to the sink
    pub bytes_written: u64,
}

/// How the producer loop stopped without an error of its own
enum Produced {
    /// Source exhausted and sink flushed
    Exhausted(u64),
    /// Hashing task dropped the conduit before end of input
    HasherGone,
}

/// Copy-and-hash engine
///
/// Holds only configuration; every call is an independent session.
#[derive(Debug, Clone)]
pub struct FanOutPipeline {
    config: PipelineConfig,
    selector: StrategySelector,
}

impl FanOutPipeline {
    /// Create a pipeline from validated configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let selector = StrategySelector::new(config.strategy)?;
        Ok(Self { config, selector })
    }

    /// Configuration in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Strategy selector in use
    pub fn selector(&self) -> &StrategySelector {
        &self.selector
    }

    /// Hash a stream of unknown length
    pub fn hash<R: Read>(&self, source: R) -> Result<DigestPair> {
        self.hash_with_hint(source, None, None)
    }

    /// Hash a stream without copying it anywhere
    pub fn hash_with_hint<R: Read>(
        &self,
        source: R,
        length_hint: Option<u64>,
        progress: Option<&mut dyn ProgressReporter>,
    ) -> Result<DigestPair> {
        let strategy = self.selector.select(length_hint);
        tracing::debug!(strategy = strategy.name(), ?length_hint, "Hashing stream");
        strategy.hash_reader(source, length_hint, progress)
    }

    /// Copy `source` into `sink` and hash the same bytes in one pass
    ///
    /// On error the sink may hold a partial copy; removing it is the
    /// caller's job. Exactly one error is returned, the first one observed.
    pub fn hash_and_persist<R: Read, W: Write>(
        &self,
        mut source: R,
        mut sink: W,
        length_hint: Option<u64>,
        progress: Option<&mut dyn ProgressReporter>,
        cancel: &CancellationToken,
    ) -> Result<PersistOutcome> {
        let cancel = match self.config.timeout() {
            Some(timeout) => cancel.deadline_after(timeout),
            None => cancel.clone(),
        };
        let strategy = self.selector.select(length_hint);
        let start = Instant::now();

        tracing::debug!(
            strategy = strategy.name(),
            ?length_hint,
            buffer_size = self.config.buffer_size,
            conduit_depth = self.config.conduit_depth,
            "Starting copy-and-hash session"
        );

        let (sender, reader) = conduit(self.config.conduit_depth);

        let outcome = thread::scope(|scope| {
            let hasher = thread::Builder::new()
                .name("dualdigest-hash".to_string())
                .spawn_scoped(scope, move || {
                    strategy.hash_reader(reader, length_hint, progress)
                })
                .map_err(|e| DigestError::fault(format!("failed to start hashing task: {}", e)))?;

            let produced = self.produce(&mut source, &mut sink, &sender, &cancel);
            // end of input for the hashing task
            drop(sender);
            let hashed = join_hasher(hasher);

            settle(produced, hashed, strategy)
        });

        match &outcome {
            Ok(outcome) => tracing::debug!(
                bytes = outcome.bytes_written,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Copy-and-hash session complete"
            ),
            Err(e) => tracing::debug!(error = %e, "Copy-and-hash session failed"),
        }

        outcome
    }

    /// Producer loop: read, send to the hashing task, write to the sink
    fn produce<R: Read, W: Write>(
        &self,
        source: &mut R,
        sink: &mut W,
        sender: &ConduitSender,
        cancel: &CancellationToken,
    ) -> Result<Produced> {
        let buffer_size = self.config.buffer_size;
        let poll_interval = self.config.poll_interval();
        let mut buffer = BytesMut::with_capacity(buffer_size);
        let mut written = 0u64;

        loop {
            cancel.check()?;

            buffer.resize(buffer_size, 0);
            let bytes_read = read_retrying(source, &mut buffer[..])?;
            if bytes_read == 0 {
                break;
            }
            buffer.truncate(bytes_read);
            let frame = buffer.split().freeze();

            if !sender.send(frame.clone(), cancel, poll_interval)? {
                if let Err(e) = sink.flush() {
                    tracing::warn!(error = %e, "Sink flush failed after hashing task stopped");
                }
                return Ok(Produced::HasherGone);
            }

            sink.write_all(&frame).map_err(DigestError::SinkWrite)?;
            written += bytes_read as u64;
        }

        sink.flush().map_err(DigestError::SinkWrite)?;
        Ok(Produced::Exhausted(written))
    }
}

impl Default for FanOutPipeline {
    fn default() -> Self {
        Self {
            config: PipelineConfig::default(),
            selector: StrategySelector::default(),
        }
    }
}

/// Combine both sides of a session into one result
fn settle(
    produced: Result<Produced>,
    hashed: Result<DigestPair>,
    strategy: HashStrategy,
) -> Result<PersistOutcome> {
    match (produced, hashed) {
        (Ok(Produced::Exhausted(written)), Ok(digests)) => {
            if digests.byte_count() != written {
                return Err(DigestError::fault(format!(
                    "{} hasher saw {} bytes but {} were written",
                    strategy.name(),
                    digests.byte_count(),
                    written
                )));
            }
            Ok(PersistOutcome {
                digests,
                bytes_written: written,
            })
        }
        (Ok(Produced::HasherGone), Ok(_)) => Err(DigestError::fault(
            "hashing task finished before end of input",
        )),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(_)) => Err(e),
        (Err(e), Err(secondary)) => {
            tracing::warn!(
                error = %e,
                discarded = %secondary,
                "Hashing task also failed; keeping the first error"
            );
            Err(e)
        }
    }
}

/// Join the hashing task, turning a panic into `InternalHashFault`
fn join_hasher(handle: ScopedJoinHandle<'_, Result<DigestPair>>) -> Result<DigestPair> {
    handle.join().unwrap_or_else(|payload| {
        Err(DigestError::fault(format!(
            "hashing task panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Hash a stream with the default configuration
pub fn hash_reader<R: Read>(source: R) -> Result<DigestPair> {
    FanOutPipeline::default().hash(source)
}

/// Copy and hash with the default configuration and no cancellation
pub fn hash_and_persist<R: Read, W: Write>(
    source: R,
    sink: W,
    length_hint: Option<u64>,
) -> Result<PersistOutcome> {
    FanOutPipeline::default().hash_and_persist(
        source,
        sink,
        length_hint,
        None,
        &CancellationToken::new(),
    )
}
