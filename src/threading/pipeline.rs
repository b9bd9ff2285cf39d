//! Orchestrator for one counting run
//!
//! The calling thread becomes the producer. Workers are spawned up front,
//! joined at the end, and their partial counts summed. Only the first failure
//! of a run is surfaced; later ones are logged and dropped.

use super::handoff::{channel_pair, PollingHandOff, ProducerSide, WorkerSide};
use super::producer::run_producer;
use super::worker::{count_delimiters, run_worker, WorkerReport};
use super::{
    CountConfig, OperationState, PipelineStats, ShutdownPolicy, Strategy, ThreadResult,
    ThreadSafeProgress,
};
use crate::error::RuwcError;
use crate::memory::BufferPool;
use std::any::Any;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Result of a counting run
///
/// `total` is always the sum of what the workers counted, even when `error`
/// is set: a failed read still yields the count of the bytes read before it.
#[derive(Debug)]
pub struct CountReport {
    pub total: u64,
    pub stats: PipelineStats,
    /// First failure of the run, if any
    pub error: Option<RuwcError>,
    /// The producer read the input up to end of file
    pub reached_eof: bool,
}

impl CountReport {
    /// Whether the whole input was counted without failure
    ///
    /// A best-effort shutdown can end cleanly with filled units never
    /// scanned; such a run is not complete.
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.reached_eof && self.stats.stranded_units() == 0
    }

    /// The total, or the run's first error
    pub fn into_result(self) -> ThreadResult<u64> {
        match self.error {
            None => Ok(self.total),
            Some(e) => Err(e),
        }
    }
}

/// Counts delimiter bytes with one producer and a pool of worker threads
#[derive(Debug, Clone)]
pub struct DelimiterCounter {
    config: CountConfig,
}

/// Sums and first error gathered from the worker threads
struct Joined {
    total: u64,
    per_worker: Vec<u64>,
    reached_eof: bool,
}

impl DelimiterCounter {
    /// Create a counter, rejecting invalid configuration up front
    pub fn new(config: CountConfig) -> ThreadResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the counting configuration
    pub fn config(&self) -> &CountConfig {
        &self.config
    }

    /// Count delimiters in the file at `path`
    pub fn count_file<P: AsRef<Path>>(&self, path: P) -> ThreadResult<CountReport> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| RuwcError::open_error(path, e))?;
        let size_hint = file.metadata().ok().filter(|m| m.is_file()).map(|m| m.len());

        tracing::info!(path = %path.display(), size = ?size_hint, "Counting file");
        self.run(file, size_hint)
    }

    /// Count delimiters in any byte stream
    pub fn count_reader<R: Read>(&self, reader: R) -> ThreadResult<CountReport> {
        self.run(reader, None)
    }

    fn run<R: Read>(&self, mut reader: R, size_hint: Option<u64>) -> ThreadResult<CountReport> {
        let started = Instant::now();
        let workers = self.config.effective_workers();
        let pool = Arc::new(BufferPool::for_workers(workers, self.config.buffer_capacity)?);
        let state = Arc::new(OperationState::new());
        let progress = if self.config.progress {
            ThreadSafeProgress::new(size_hint)
        } else {
            ThreadSafeProgress::new_silent(size_hint)
        };

        let span = tracing::info_span!(
            "count",
            workers,
            units = pool.len(),
            unit_capacity = self.config.buffer_capacity,
            strategy = %self.config.strategy,
        );
        let _enter = span.enter();
        tracing::info!(
            bytes = pool.len() * pool.unit_capacity(),
            "Allocated buffer pool"
        );

        let mut first_error = None;
        let joined = crate::timed_operation!("count", state.bytes_read(), match self.config.strategy {
            Strategy::Polling => {
                let side = PollingHandOff::new(
                    Arc::clone(&pool),
                    Arc::clone(&state),
                    self.config.shutdown,
                    self.config.poll_interval,
                );
                let prototype = side.clone();
                self.drive(
                    &mut reader,
                    side,
                    move || prototype.clone(),
                    workers,
                    &state,
                    &progress,
                    &mut first_error,
                )
            }
            Strategy::Channel => {
                let (producer, prototype) =
                    channel_pair(Arc::clone(&pool), Arc::clone(&state), self.config.shutdown);
                self.drive(
                    &mut reader,
                    producer,
                    move || prototype.clone(),
                    workers,
                    &state,
                    &progress,
                    &mut first_error,
                )
            }
        });
        progress.finish();

        let stats = PipelineStats {
            workers,
            pool_units: pool.len(),
            unit_capacity: pool.unit_capacity(),
            strategy: self.config.strategy,
            bytes_read: state.bytes_read(),
            units_filled: state.units_filled(),
            units_scanned: state.units_scanned(),
            starving: state.starving(),
            resting: state.resting(),
            elapsed: started.elapsed(),
            per_worker: joined.per_worker,
        };

        if stats.stranded_units() > 0 {
            tracing::warn!(stranded = stats.stranded_units(), "Filled units left unscanned at shutdown");
        }
        tracing::info!(
            total = joined.total,
            starving_ms = stats.starving.as_millis() as u64,
            resting_ms = stats.resting.as_millis() as u64,
            failed = first_error.is_some(),
            "Counting finished"
        );

        // The pool's storage is released here on every path
        drop(pool);

        Ok(CountReport {
            total: joined.total,
            stats,
            error: first_error,
            reached_eof: joined.reached_eof,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn drive<R, P, S, F>(
        &self,
        reader: &mut R,
        mut producer: P,
        make_worker: F,
        workers: usize,
        state: &Arc<OperationState>,
        progress: &ThreadSafeProgress,
        first_error: &mut Option<RuwcError>,
    ) -> Joined
    where
        R: Read,
        P: ProducerSide,
        S: WorkerSide + 'static,
        F: FnMut() -> S,
    {
        let handles = spawn_workers(workers, make_worker, state, first_error);

        let mut reached_eof = false;
        if first_error.is_none() {
            match run_producer(reader, &mut producer, state, progress) {
                Ok(outcome) => reached_eof = outcome.reached_eof,
                Err(e) => {
                    // Units published before a read failure are still counted
                    if !matches!(e, RuwcError::Read { .. }) {
                        state.stop();
                    }
                    record_error(first_error, e);
                }
            }
        }

        producer.finish();
        match self.config.shutdown {
            ShutdownPolicy::Drain => state.mark_input_done(),
            ShutdownPolicy::BestEffort => state.stop(),
        }
        drop(producer);

        let mut joined = join_workers(handles, workers, first_error);
        joined.reached_eof = reached_eof;
        state.stop();
        joined
    }
}

struct StopOnPanic(Arc<OperationState>);

impl Drop for StopOnPanic {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.stop();
        }
    }
}

/// Spawn up to `workers` threads; on the first spawn failure the run is
/// stopped and the threads already started are returned for joining.
fn spawn_workers<S, F>(
    workers: usize,
    mut make_worker: F,
    state: &Arc<OperationState>,
    first_error: &mut Option<RuwcError>,
) -> Vec<JoinHandle<WorkerReport>>
where
    S: WorkerSide + 'static,
    F: FnMut() -> S,
{
    let mut handles = Vec::with_capacity(workers);

    for id in 0..workers {
        let side = make_worker();
        let worker_state = Arc::clone(state);
        let spawned = thread::Builder::new()
            .name(format!("ruwc-worker-{}", id))
            .spawn(move || {
                let _guard = StopOnPanic(Arc::clone(&worker_state));
                run_worker(id, side, &worker_state)
            });

        match spawned {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                tracing::error!(worker = id, error = %e, "Failed to spawn worker");
                state.stop();
                record_error(first_error, RuwcError::thread_spawn_error(id, e));
                break;
            }
        }
    }

    // Drop the prototype so its channel ends do not outlive the workers
    drop(make_worker);
    handles
}

fn join_workers(
    handles: Vec<JoinHandle<WorkerReport>>,
    workers: usize,
    first_error: &mut Option<RuwcError>,
) -> Joined {
    let mut joined = Joined {
        total: 0,
        per_worker: vec![0; workers],
        reached_eof: false,
    };

    for (id, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(report) => {
                joined.total += report.count;
                joined.per_worker[report.id] = report.count;
                if let Some(e) = report.error {
                    record_error(first_error, e);
                }
            }
            Err(payload) => {
                record_error(
                    first_error,
                    RuwcError::thread_join_error(id, panic_message(payload.as_ref())),
                );
            }
        }
    }

    joined
}

fn record_error(slot: &mut Option<RuwcError>, err: RuwcError) {
    match slot {
        None => *slot = Some(err),
        Some(first) => {
            tracing::warn!(error = %err, first = %first, "Additional failure after the first one");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("worker panicked: {}", s)
    } else {
        "worker panicked".to_string()
    }
}

/// Count delimiters in the file at `path` with `workers` threads and
/// `capacity`-byte buffers
pub fn count_lines<P: AsRef<Path>>(path: P, workers: usize, capacity: usize) -> ThreadResult<CountReport> {
    let config = CountConfig::new()
        .with_workers(workers)
        .with_buffer_capacity(capacity);
    DelimiterCounter::new(config)?.count_file(path)
}

/// Single-threaded reference count over the whole stream
pub fn count_sequential<R: Read>(mut reader: R) -> ThreadResult<u64> {
    let mut buf = vec![0u8; crate::memory::DEFAULT_UNIT_CAPACITY];
    let mut total = 0u64;
    let mut bytes_read = 0u64;

    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => {
                total += count_delimiters(&buf[..n]);
                bytes_read += n as u64;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(RuwcError::read_error("Input read failed", bytes_read, e)),
        }
    }
}
