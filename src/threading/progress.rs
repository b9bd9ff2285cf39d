//! Thread-safe progress tracking for the producer's byte count

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Bytes between two progress log lines
pub const REPORT_INTERVAL: u64 = 100 * 1024 * 1024;

/// Thread-safe progress tracker
#[derive(Clone)]
pub struct ThreadSafeProgress {
    inner: Arc<Mutex<ProgressInner>>,
    #[cfg(feature = "progress")]
    progress_bar: Option<Arc<ProgressBar>>,
}

struct ProgressInner {
    total: Option<u64>,
    current: u64,
    start_time: Instant,
    next_report: u64,
}

impl ProgressInner {
    fn new(total: Option<u64>) -> Self {
        Self {
            total,
            current: 0,
            start_time: Instant::now(),
            next_report: REPORT_INTERVAL,
        }
    }
}

impl ThreadSafeProgress {
    /// Create a tracker that draws a progress bar when stderr is a terminal
    pub fn new(total: Option<u64>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ProgressInner::new(total))),
            #[cfg(feature = "progress")]
            progress_bar: Self::create_progress_bar(total),
        }
    }

    /// Create a tracker without visual progress bar
    pub fn new_silent(total: Option<u64>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ProgressInner::new(total))),
            #[cfg(feature = "progress")]
            progress_bar: None,
        }
    }

    #[cfg(feature = "progress")]
    fn create_progress_bar(total: Option<u64>) -> Option<Arc<ProgressBar>> {
        if !atty::is(atty::Stream::Stderr) {
            return None;
        }

        let (pb, template) = match total {
            Some(len) => (
                ProgressBar::new(len),
                "[{elapsed_precise}] {bar:40.cyan/blue} {bytes:>10}/{total_bytes:10} {binary_bytes_per_sec} ({eta})",
            ),
            None => (
                ProgressBar::new_spinner(),
                "[{elapsed_precise}] {spinner} {bytes:>10} {binary_bytes_per_sec}",
            ),
        };
        let style = ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");
        pb.set_style(style);
        Some(Arc::new(pb))
    }

    /// Record `delta` more bytes read
    pub fn inc(&self, delta: u64) {
        let (current, report) = match self.inner.lock() {
            Ok(mut inner) => {
                inner.current += delta;
                let report = if inner.current >= inner.next_report {
                    while inner.next_report <= inner.current {
                        inner.next_report += REPORT_INTERVAL;
                    }
                    Some(inner.start_time.elapsed())
                } else {
                    None
                };
                (inner.current, report)
            }
            Err(_) => return,
        };

        if let Some(elapsed) = report {
            tracing::info!(
                read = %crate::utils::format_size(current),
                throughput_mib_s = crate::utils::throughput_mib_per_sec(current, elapsed),
                "Counting progress"
            );
        }

        #[cfg(feature = "progress")]
        if let Some(ref pb) = self.progress_bar {
            pb.set_position(current);
        }
    }

    /// Bytes recorded so far
    pub fn current(&self) -> u64 {
        self.inner.lock().map(|inner| inner.current).unwrap_or(0)
    }

    /// Get current progress information
    pub fn get_progress(&self) -> Option<ProgressInfo> {
        let inner = self.inner.lock().ok()?;
        let elapsed = inner.start_time.elapsed();
        Some(ProgressInfo {
            current: inner.current,
            total: inner.total,
            percentage: inner.total.map(|total| {
                if total > 0 {
                    (inner.current as f64 / total as f64 * 100.0).min(100.0)
                } else {
                    100.0
                }
            }),
            elapsed,
            throughput_mib_per_sec: crate::utils::throughput_mib_per_sec(inner.current, elapsed),
        })
    }

    /// Finish the progress tracking
    pub fn finish(&self) {
        #[cfg(feature = "progress")]
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }
}

/// Progress information snapshot
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    pub current: u64,
    /// Input size when known up front
    pub total: Option<u64>,
    pub percentage: Option<f64>,
    pub elapsed: Duration,
    pub throughput_mib_per_sec: f64,
}
