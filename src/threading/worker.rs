//! Worker loop: claim a filled unit, count delimiters, hand it back empty

use super::handoff::WorkerSide;
use super::OperationState;
use crate::error::RuwcError;

/// The byte being counted
pub const DELIMITER: u8 = b'\n';

/// Count delimiter bytes in `data`
pub fn count_delimiters(data: &[u8]) -> u64 {
    memchr::memchr_iter(DELIMITER, data).count() as u64
}

/// What one worker thread hands back when it exits
#[derive(Debug)]
pub struct WorkerReport {
    pub id: usize,
    /// Delimiters counted by this worker
    pub count: u64,
    /// Units this worker scanned
    pub units: u64,
    pub bytes: u64,
    /// Failure that ended this worker early, if any
    pub error: Option<RuwcError>,
}

/// Run one worker until the hand-off reports nothing more to do
///
/// A failing worker stops the whole run; the count it gathered so far is
/// still reported.
pub fn run_worker<S: WorkerSide>(id: usize, mut side: S, state: &OperationState) -> WorkerReport {
    let span = tracing::debug_span!("worker", id);
    let _enter = span.enter();

    let mut count = 0u64;
    let mut units = 0u64;
    let mut bytes = 0u64;

    let error = loop {
        match side.claim_filled() {
            Ok(Some(handle)) => {
                count += count_delimiters(handle.data());
                units += 1;
                bytes += handle.len() as u64;
                state.record_scan();
                if let Err(e) = side.release(handle) {
                    break Some(e);
                }
            }
            Ok(None) => break None,
            Err(e) => break Some(e),
        }
    };

    if let Some(ref e) = error {
        tracing::error!(error = %e, "Worker failed, stopping pipeline");
        state.stop();
    }
    tracing::debug!(count, units, bytes, "Worker finished");

    WorkerReport {
        id,
        count,
        units,
        bytes,
        error,
    }
}
