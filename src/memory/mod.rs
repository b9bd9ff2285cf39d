//! Buffer memory for the counting pipeline
//!
//! All file content passes through a fixed [`BufferPool`] allocated once per
//! counting run. Units are recycled rather than reallocated, so peak memory is
//! `units * unit_capacity` regardless of input size.

pub mod pool;

pub use pool::{BufferPool, PoolStats, UnitHandle, UnitStatus};

/// Default capacity of one buffer unit (1 MiB)
pub const DEFAULT_UNIT_CAPACITY: usize = 1024 * 1024;

/// Units allocated per worker thread
pub const UNITS_PER_WORKER: usize = 2;

/// Bytes a pool for `workers` threads would allocate, if it fits in `isize`
pub fn pool_footprint(workers: usize, unit_capacity: usize) -> Option<usize> {
    workers
        .checked_mul(UNITS_PER_WORKER)?
        .checked_mul(unit_capacity)
        .filter(|total| *total <= isize::MAX as usize)
}
