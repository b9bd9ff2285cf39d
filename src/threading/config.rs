//! Counting configuration for the producer/worker pipeline

use crate::error::{Result, RuwcError};
use crate::memory::{pool_footprint, DEFAULT_UNIT_CAPACITY};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How idle threads wait for work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Bounded hand-off queues; idle threads block on a channel
    #[default]
    Channel,
    /// Lock-and-scan the pool, sleeping a fixed interval when nothing is ready
    Polling,
}

/// What happens to in-flight units when input ends or fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShutdownPolicy {
    /// Workers scan every Filled unit before exiting
    #[default]
    Drain,
    /// Workers stop at their next loop check; Filled units may be left
    /// unscanned.
    BestEffort,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Channel => f.write_str("channel"),
            Strategy::Polling => f.write_str("polling"),
        }
    }
}

impl FromStr for Strategy {
    type Err = RuwcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "channel" => Ok(Strategy::Channel),
            "polling" | "poll" => Ok(Strategy::Polling),
            _ => Err(RuwcError::invalid_configuration(
                format!("Unknown strategy: {}", s),
                Some(s.to_string()),
            )),
        }
    }
}

impl fmt::Display for ShutdownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownPolicy::Drain => f.write_str("drain"),
            ShutdownPolicy::BestEffort => f.write_str("best-effort"),
        }
    }
}

impl FromStr for ShutdownPolicy {
    type Err = RuwcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "drain" => Ok(ShutdownPolicy::Drain),
            "best-effort" | "besteffort" => Ok(ShutdownPolicy::BestEffort),
            _ => Err(RuwcError::invalid_configuration(
                format!("Unknown shutdown policy: {}", s),
                Some(s.to_string()),
            )),
        }
    }
}

/// Configuration for one counting run
#[derive(Debug, Clone)]
pub struct CountConfig {
    /// Number of worker threads (None = one per available CPU)
    pub workers: Option<usize>,
    /// Capacity of each buffer unit in bytes
    pub buffer_capacity: usize,
    /// Scheduling strategy
    pub strategy: Strategy,
    /// Shutdown behaviour for in-flight units
    pub shutdown: ShutdownPolicy,
    /// Sleep between polls when the polling strategy finds nothing to do
    pub poll_interval: Duration,
    /// Draw a progress bar on stderr when it is a terminal
    pub progress: bool,
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            workers: None,
            buffer_capacity: DEFAULT_UNIT_CAPACITY,
            strategy: Strategy::default(),
            shutdown: ShutdownPolicy::default(),
            poll_interval: Duration::from_millis(1),
            progress: false,
        }
    }
}

impl CountConfig {
    /// Create a new counting configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of workers; `validate()` rejects zero
    pub fn with_workers(mut self, count: usize) -> Self {
        self.workers = Some(count);
        self
    }

    /// Use one worker per available CPU
    pub fn with_auto_workers(mut self) -> Self {
        self.workers = None;
        self
    }

    /// Set the capacity of each buffer unit
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity; // validate() rejects zero
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownPolicy) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Get effective worker count (auto-detect if None)
    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| num_cpus::get().max(1))
    }

    /// Number of units in the pool
    pub fn pool_units(&self) -> usize {
        self.effective_workers().saturating_mul(crate::memory::UNITS_PER_WORKER)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(RuwcError::invalid_configuration(
                "Worker count must be greater than zero",
                Some("0".to_string()),
            ));
        }

        if self.buffer_capacity == 0 {
            return Err(RuwcError::invalid_configuration(
                "Buffer capacity must be greater than zero",
                Some(self.buffer_capacity.to_string()),
            ));
        }

        let workers = self.effective_workers();
        if pool_footprint(workers, self.buffer_capacity).is_none() {
            return Err(RuwcError::invalid_configuration(
                format!(
                    "{} workers with {} byte buffers overflow the addressable size",
                    workers, self.buffer_capacity
                ),
                None,
            ));
        }

        if self.strategy == Strategy::Polling && self.poll_interval.is_zero() {
            return Err(RuwcError::invalid_configuration(
                "Poll interval must be greater than zero",
                None,
            ));
        }

        Ok(())
    }
}
