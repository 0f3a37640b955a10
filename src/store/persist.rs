//! Persisting files with their content identity

use super::record::ContentRecord;
use crate::error::{DigestError, IoResultExt, Result};
use crate::pipeline::{CancellationToken, FanOutPipeline};
use crate::progress::ProgressReporter;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Copy `source_path` to `dest_path` and hash it in the same pass
///
/// Parent directories of the destination are created. A destination that
/// is the source file itself, by path or by hard link, is refused before
/// anything is truncated. If the session fails, the partial destination is
/// removed on a best-effort basis and the session error is returned either
/// way.
pub fn persist_file(
    pipeline: &FanOutPipeline,
    source_path: &Path,
    dest_path: &Path,
    progress: Option<&mut dyn ProgressReporter>,
    cancel: &CancellationToken,
) -> Result<ContentRecord> {
    let source = File::open(source_path).with_path(source_path)?;
    let source_meta = source.metadata().with_path(source_path)?;
    let size = source_meta.len();

    if is_same_file(source_path, &source_meta, dest_path)? {
        return Err(DigestError::config(format!(
            "source and destination are the same file: {}",
            dest_path.display()
        )));
    }

    if let Some(parent) = dest_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_path(parent)?;
        }
    }
    let mut dest = File::create(dest_path).with_path(dest_path)?;

    let result = pipeline.hash_and_persist(source, &mut dest, Some(size), progress, cancel);
    drop(dest);

    match result {
        Ok(outcome) => {
            let name = source_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| source_path.display().to_string());

            tracing::info!(
                name = %name,
                dest = %dest_path.display(),
                bytes = outcome.bytes_written,
                blake3 = %outcome.digests.primary(),
                "Stored content"
            );
            Ok(ContentRecord::new(name, outcome.digests))
        }
        Err(e) => {
            discard_partial(dest_path, &e);
            Err(e)
        }
    }
}

/// Check whether `dest_path` already names the open source file
fn is_same_file(
    source_path: &Path,
    source_meta: &fs::Metadata,
    dest_path: &Path,
) -> Result<bool> {
    let dest_meta = match fs::metadata(dest_path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(DigestError::io(dest_path, e)),
    };
    if same_inode(source_meta, &dest_meta) {
        return Ok(true);
    }

    let source = fs::canonicalize(source_path).with_path(source_path)?;
    let dest = fs::canonicalize(dest_path).with_path(dest_path)?;
    Ok(source == dest)
}

#[cfg(unix)]
fn same_inode(a: &fs::Metadata, b: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_inode(_: &fs::Metadata, _: &fs::Metadata) -> bool {
    false
}

/// Remove a destination left behind by a failed session
fn discard_partial(dest_path: &Path, cause: &DigestError) {
    match fs::remove_file(dest_path) {
        Ok(()) => tracing::debug!(
            dest = %dest_path.display(),
            cause = %cause,
            "Removed partial destination"
        ),
        Err(e) => tracing::warn!(
            dest = %dest_path.display(),
            error = %e,
            cause = %cause,
            "Failed to remove partial destination"
        ),
    }
}

/// Trips a token when dropped unless disarmed
struct CancelOnDrop {
    token: CancellationToken,
    armed: bool,
}

impl CancelOnDrop {
    fn new(token: CancellationToken) -> Self {
        Self { token, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.token.cancel();
        }
    }
}

/// Run [`persist_file`] on the blocking thread pool
///
/// Dropping the returned future cancels the session; the blocking task
/// then stops at its next cancellation check and cleans up after itself.
pub async fn persist_file_async(
    pipeline: FanOutPipeline,
    source_path: PathBuf,
    dest_path: PathBuf,
    timeout: Option<Duration>,
) -> Result<ContentRecord> {
    let cancel = CancellationToken::new();
    let guard = CancelOnDrop::new(cancel.clone());
    let token = match timeout {
        Some(timeout) => cancel.deadline_after(timeout),
        None => cancel,
    };

    let result = tokio::task::spawn_blocking(move || {
        persist_file(&pipeline, &source_path, &dest_path, None, &token)
    })
    .await
    .map_err(|e| DigestError::fault(format!("blocking task failed: {e}")))?;

    guard.disarm();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::error::CancelReason;
    use crate::hash::hash_bytes;
    use crate::test_util::pseudo_random;
    use tempfile::TempDir;

    fn write_source(dir: &Path, data: &[u8]) -> PathBuf {
        let path = dir.join("upload.bin");
        fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_persist_file_creates_parents() {
        let temp = TempDir::new().unwrap();
        let data = pseudo_random(2 * 1024 * 1024 + 9, 61);
        let source = write_source(temp.path(), &data);
        let dest = temp.path().join("store/ab/cd/upload.bin");

        let record = persist_file(
            &FanOutPipeline::default(),
            &source,
            &dest,
            None,
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(record.name, "upload.bin");
        assert_eq!(record.size, data.len() as u64);
        assert_eq!(record.digests, hash_bytes(&data));
        assert_eq!(fs::read(&dest).unwrap(), data);
    }

    #[test]
    fn test_cancelled_session_removes_destination() {
        let temp = TempDir::new().unwrap();
        let source = write_source(temp.path(), &pseudo_random(100_000, 62));
        let dest = temp.path().join("out.bin");
        let token = CancellationToken::new();
        token.cancel();

        let err = persist_file(&FanOutPipeline::default(), &source, &dest, None, &token)
            .unwrap_err();

        assert!(matches!(err, DigestError::Cancelled(CancelReason::Requested)));
        assert!(!dest.exists());
    }

    #[test]
    fn test_missing_source_leaves_no_destination() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out.bin");

        let err = persist_file(
            &FanOutPipeline::default(),
            &temp.path().join("nope.bin"),
            &dest,
            None,
            &CancellationToken::new(),
        )
        .unwrap_err();

        assert!(matches!(err, DigestError::Io { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_same_source_and_destination_is_refused() {
        let temp = TempDir::new().unwrap();
        let data = pseudo_random(100_000, 65);
        let source = write_source(temp.path(), &data);
        let pipeline = FanOutPipeline::default();
        let token = CancellationToken::new();

        let err = persist_file(&pipeline, &source, &source, None, &token).unwrap_err();
        assert!(matches!(err, DigestError::ConfigError(_)));
        assert_eq!(fs::read(&source).unwrap(), data);

        let dotted = temp.path().join(".").join("upload.bin");
        assert!(persist_file(&pipeline, &source, &dotted, None, &token).is_err());
        assert_eq!(fs::read(&source).unwrap(), data);
    }

    #[cfg(unix)]
    #[test]
    fn test_hard_link_destination_is_refused() {
        let temp = TempDir::new().unwrap();
        let data = pseudo_random(50_000, 66);
        let source = write_source(temp.path(), &data);
        let link = temp.path().join("link.bin");
        fs::hard_link(&source, &link).unwrap();

        let err = persist_file(
            &FanOutPipeline::default(),
            &source,
            &link,
            None,
            &CancellationToken::new(),
        )
        .unwrap_err();

        assert!(matches!(err, DigestError::ConfigError(_)));
        assert_eq!(fs::read(&source).unwrap(), data);
    }

    #[test]
    fn test_existing_distinct_destination_is_overwritten() {
        let temp = TempDir::new().unwrap();
        let data = pseudo_random(30_000, 67);
        let source = write_source(temp.path(), &data);
        let dest = temp.path().join("old.bin");
        fs::write(&dest, b"stale contents").unwrap();

        let record = persist_file(
            &FanOutPipeline::default(),
            &source,
            &dest,
            None,
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(record.digests, hash_bytes(&data));
        assert_eq!(fs::read(&dest).unwrap(), data);
    }

    #[test]
    fn test_cancel_on_drop_guard() {
        let token = CancellationToken::new();
        drop(CancelOnDrop::new(token.clone()));
        assert!(token.is_cancelled());

        let token = CancellationToken::new();
        CancelOnDrop::new(token.clone()).disarm();
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_persist_file_async() {
        let temp = TempDir::new().unwrap();
        let data = pseudo_random(500_000, 63);
        let source = write_source(temp.path(), &data);
        let dest = temp.path().join("async/out.bin");

        let record = persist_file_async(FanOutPipeline::default(), source, dest.clone(), None)
            .await
            .unwrap();

        assert_eq!(record.digests, hash_bytes(&data));
        assert_eq!(fs::read(&dest).unwrap(), data);
    }

    #[tokio::test]
    async fn test_persist_file_async_timeout() {
        let temp = TempDir::new().unwrap();
        let source = write_source(temp.path(), &pseudo_random(500_000, 64));
        let dest = temp.path().join("late.bin");
        let pipeline = FanOutPipeline::new(PipelineConfig::default()).unwrap();

        let err = persist_file_async(pipeline, source, dest.clone(), Some(Duration::ZERO))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DigestError::Cancelled(CancelReason::DeadlineExceeded)
        ));
        assert!(!dest.exists());
    }
}
