//! Producer loop: claim an empty unit, fill it from the input, publish it

use super::handoff::ProducerSide;
use super::{OperationState, ThreadResult, ThreadSafeProgress};
use crate::error::RuwcError;
use std::io::{ErrorKind, Read};

/// How the producer loop ended
#[derive(Debug)]
pub struct ProducerOutcome {
    pub bytes_read: u64,
    pub units_published: u64,
    /// Input reached end of file (false when the run was stopped or failed)
    pub reached_eof: bool,
}

/// Single read into `buf`, retrying only on `Interrupted`
fn read_unit<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Fill units from `reader` until end of input, a read failure, or a stop
///
/// A read failure is returned as [`RuwcError::Read`] after the claimed unit
/// has been handed back through [`ProducerSide::abandon`]. Units published
/// before the failure remain available to the workers.
pub fn run_producer<R: Read, P: ProducerSide>(
    reader: &mut R,
    side: &mut P,
    state: &OperationState,
    progress: &ThreadSafeProgress,
) -> ThreadResult<ProducerOutcome> {
    let mut outcome = ProducerOutcome {
        bytes_read: 0,
        units_published: 0,
        reached_eof: false,
    };

    loop {
        let mut handle = match side.claim_empty()? {
            Some(handle) => handle,
            None => {
                tracing::debug!("Producer stopped before end of input");
                break;
            }
        };

        let read = match read_unit(reader, handle.fill_buffer()) {
            Ok(0) => {
                side.abandon(handle)?;
                outcome.reached_eof = true;
                break;
            }
            Ok(n) => n,
            Err(e) => {
                if let Err(abandon_err) = side.abandon(handle) {
                    tracing::warn!(error = %abandon_err, "Could not return unit after read failure");
                }
                return Err(RuwcError::read_error(
                    "Input read failed",
                    outcome.bytes_read,
                    e,
                ));
            }
        };

        side.publish(handle, read)?;
        outcome.bytes_read += read as u64;
        outcome.units_published += 1;
        state.record_fill(read);
        progress.inc(read as u64);
    }

    tracing::debug!(
        bytes = outcome.bytes_read,
        units = outcome.units_published,
        eof = outcome.reached_eof,
        "Producer finished"
    );
    Ok(outcome)
}
