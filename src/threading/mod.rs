//! Threading module for the parallel counting pipeline
//!
//! One producer (the calling thread) reads the input into pooled buffer units
//! while N worker threads scan filled units for delimiter bytes. Units are
//! handed between the two sides either through bounded channels or by polling
//! the pool; see [`Strategy`].

pub mod config;
pub mod handoff;
pub mod pipeline;
pub mod producer;
pub mod progress;
pub mod worker;

pub use config::{CountConfig, ShutdownPolicy, Strategy};
pub use pipeline::{count_lines, count_sequential, CountReport, DelimiterCounter};
pub use progress::ThreadSafeProgress;
pub use worker::{count_delimiters, WorkerReport, DELIMITER};

use crate::error::RuwcError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Result type for threading operations
pub type ThreadResult<T> = Result<T, RuwcError>;

/// Flags and diagnostic counters for one counting run
///
/// The counters are diagnostics only. Buffer ownership is decided by the
/// pool lock, never by these atomics.
#[derive(Debug)]
pub struct OperationState {
    running: AtomicBool,
    input_done: AtomicBool,
    starving_nanos: AtomicU64,
    resting_nanos: AtomicU64,
    units_filled: AtomicU64,
    units_scanned: AtomicU64,
    bytes_read: AtomicU64,
}

impl Default for OperationState {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            input_done: AtomicBool::new(false),
            starving_nanos: AtomicU64::new(0),
            resting_nanos: AtomicU64::new(0),
            units_filled: AtomicU64::new(0),
            units_scanned: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
        }
    }

    /// Whether the pipeline is still active
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask every thread to stop at its next check
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// The producer has published its last unit
    pub fn mark_input_done(&self) {
        self.input_done.store(true, Ordering::Release);
    }

    pub fn input_done(&self) -> bool {
        self.input_done.load(Ordering::Acquire)
    }

    /// Workers waited this long for a Filled unit
    pub fn add_starving(&self, waited: Duration) {
        self.starving_nanos.fetch_add(duration_nanos(waited), Ordering::Relaxed);
    }

    /// The producer waited this long for an Empty unit
    pub fn add_resting(&self, waited: Duration) {
        self.resting_nanos.fetch_add(duration_nanos(waited), Ordering::Relaxed);
    }

    pub fn record_fill(&self, bytes: usize) {
        self.units_filled.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_scan(&self) {
        self.units_scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn starving(&self) -> Duration {
        Duration::from_nanos(self.starving_nanos.load(Ordering::Relaxed))
    }

    pub fn resting(&self) -> Duration {
        Duration::from_nanos(self.resting_nanos.load(Ordering::Relaxed))
    }

    pub fn units_filled(&self) -> u64 {
        self.units_filled.load(Ordering::Relaxed)
    }

    pub fn units_scanned(&self) -> u64 {
        self.units_scanned.load(Ordering::Relaxed)
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }
}

fn duration_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Statistics of a finished counting run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStats {
    pub workers: usize,
    pub pool_units: usize,
    pub unit_capacity: usize,
    pub strategy: Strategy,
    pub bytes_read: u64,
    pub units_filled: u64,
    pub units_scanned: u64,
    /// Total time workers spent waiting for a Filled unit
    pub starving: Duration,
    /// Total time the producer spent waiting for an Empty unit
    pub resting: Duration,
    pub elapsed: Duration,
    /// Delimiters counted by each worker, by worker id
    pub per_worker: Vec<u64>,
}

impl PipelineStats {
    /// Read throughput in MiB/s
    pub fn throughput_mib_per_sec(&self) -> f64 {
        crate::utils::throughput_mib_per_sec(self.bytes_read, self.elapsed)
    }

    /// Units that were filled but never scanned
    pub fn stranded_units(&self) -> u64 {
        self.units_filled.saturating_sub(self.units_scanned)
    }
}
