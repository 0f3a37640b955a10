//! Concrete progress reporters
//!
//! - [`ProgressBarReporter`]: indicatif bar with throughput and ETA
//! - [`LogReporter`]: rate-limited tracing lines for non-TTY environments

use super::{ProgressReporter, ProgressSample};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

/// Terminal progress bar for a single stream
pub struct ProgressBarReporter {
    bar: ProgressBar,
}

impl ProgressBarReporter {
    /// Create a bar; `total` is the expected stream length when known
    pub fn new(total: Option<u64>) -> Self {
        let bar = match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template("{prefix:.bold.dim} [{bar:40.green/white}] {bytes}/{total_bytes} ({bytes_per_sec}, ETA {eta})")
                        .expect("Invalid template")
                        .progress_chars("=> "),
                );
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.cyan} {prefix:.bold.dim} {bytes} ({bytes_per_sec})")
                        .expect("Invalid template"),
                );
                bar
            }
        };
        bar.set_prefix("Hash");

        Self { bar }
    }

    /// Create a reporter that draws nothing (for quiet mode)
    pub fn hidden() -> Self {
        let reporter = Self::new(None);
        reporter.bar.set_draw_target(ProgressDrawTarget::hidden());
        reporter
    }

    /// Bytes shown so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Finish progress with success message
    pub fn finish_success(&self, message: &str) {
        self.bar.finish_with_message(format!("✓ {}", message));
    }

    /// Finish progress with error message
    pub fn finish_error(&self, message: &str) {
        self.bar.abandon_with_message(format!("✗ {}", message));
    }
}

impl ProgressReporter for ProgressBarReporter {
    fn report(&mut self, sample: ProgressSample) {
        self.bar.set_position(sample.bytes_processed);
    }
}

/// Progress summary
#[derive(Debug, Clone)]
pub struct ProgressSummary {
    /// Expected total, if known
    pub total_bytes: Option<u64>,
    /// Bytes hashed so far
    pub bytes_processed: u64,
    /// Elapsed time
    pub elapsed: Duration,
    /// Throughput in bytes/second
    pub throughput: f64,
}

impl ProgressSummary {
    /// Get completion percentage, if the total is known
    pub fn percentage(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) => Some(100.0),
            Some(total) => Some((self.bytes_processed as f64 / total as f64) * 100.0),
            None => None,
        }
    }
}

/// Logs progress through `tracing` at most once per interval
pub struct LogReporter {
    label: String,
    start_time: Instant,
    last_report: Option<Instant>,
    report_interval: Duration,
    total_bytes: Option<u64>,
    bytes_processed: u64,
}

impl LogReporter {
    /// Create a log reporter with a one second interval
    pub fn new(label: impl Into<String>, total_bytes: Option<u64>) -> Self {
        Self {
            label: label.into(),
            start_time: Instant::now(),
            last_report: None,
            report_interval: Duration::from_secs(1),
            total_bytes,
            bytes_processed: 0,
        }
    }

    /// Change the reporting interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Current summary
    pub fn summary(&self) -> ProgressSummary {
        let elapsed = self.start_time.elapsed();
        let secs = elapsed.as_secs_f64();
        ProgressSummary {
            total_bytes: self.total_bytes,
            bytes_processed: self.bytes_processed,
            elapsed,
            throughput: if secs > 0.0 {
                self.bytes_processed as f64 / secs
            } else {
                0.0
            },
        }
    }

    fn log_progress(&self) {
        let summary = self.summary();
        let percent = summary
            .percentage()
            .map(|p| format!("{:.1}%", p))
            .unwrap_or_else(|| "?".to_string());

        tracing::info!(
            label = %self.label,
            bytes = summary.bytes_processed,
            "[{}] {} hashed @ {}/s",
            percent,
            humansize::format_size(summary.bytes_processed, humansize::BINARY),
            humansize::format_size(summary.throughput as u64, humansize::BINARY)
        );
    }

    /// Log the final line
    pub fn finish(&self) {
        let summary = self.summary();
        tracing::info!(
            label = %self.label,
            bytes = summary.bytes_processed,
            "Completed: {} in {:.1?} ({}/s)",
            humansize::format_size(summary.bytes_processed, humansize::BINARY),
            summary.elapsed,
            humansize::format_size(summary.throughput as u64, humansize::BINARY)
        );
    }
}

impl ProgressReporter for LogReporter {
    fn report(&mut self, sample: ProgressSample) {
        self.bytes_processed = sample.bytes_processed;

        let now = Instant::now();
        let due = match self.last_report {
            Some(last) => now.duration_since(last) >= self.report_interval,
            None => true,
        };

        if due {
            self.last_report = Some(now);
            self.log_progress();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_reporter() {
        let mut reporter = ProgressBarReporter::hidden();
        reporter.report(ProgressSample::new(500));
        reporter.report(ProgressSample::new(1500));
        assert_eq!(reporter.position(), 1500);
        reporter.finish_success("done");
    }

    #[test]
    fn test_log_reporter_tracks_latest_sample() {
        let mut reporter = LogReporter::new("upload.bin", Some(1000))
            .with_interval(Duration::from_secs(3600));
        reporter.report(ProgressSample::new(250));
        reporter.report(ProgressSample::new(500));

        let summary = reporter.summary();
        assert_eq!(summary.bytes_processed, 500);
        assert_eq!(summary.percentage(), Some(50.0));
    }

    #[test]
    fn test_summary_percentage_edge_cases() {
        let summary = ProgressSummary {
            total_bytes: Some(0),
            bytes_processed: 0,
            elapsed: Duration::ZERO,
            throughput: 0.0,
        };
        assert_eq!(summary.percentage(), Some(100.0));

        let unknown = ProgressSummary {
            total_bytes: None,
            ..summary
        };
        assert_eq!(unknown.percentage(), None);
    }
}
