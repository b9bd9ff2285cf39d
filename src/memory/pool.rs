//! Fixed buffer pool with a four-state ownership cycle
//!
//! Every unit moves through `Empty -> Filling -> Filled -> Scanning -> Empty`.
//! A transition is made under the single pool lock by the thread that
//! observed the required prior status. The unit's storage is moved into the
//! returned [`UnitHandle`] for the duration of the unlocked I/O or scan work
//! and moved back on commit, so a byte block is never reachable from two
//! threads at once.

use crate::error::{Result, RuwcError};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Status of a single buffer unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitStatus {
    /// Free for the producer
    Empty,
    /// Owned by the producer while a read is in flight
    Filling,
    /// Holds unscanned bytes, free for any worker
    Filled,
    /// Owned by a worker while it counts
    Scanning,
}

impl UnitStatus {
    /// The only status this one may move to on commit or claim
    pub fn next(self) -> UnitStatus {
        match self {
            UnitStatus::Empty => UnitStatus::Filling,
            UnitStatus::Filling => UnitStatus::Filled,
            UnitStatus::Filled => UnitStatus::Scanning,
            UnitStatus::Scanning => UnitStatus::Empty,
        }
    }

    /// Whether `self -> to` is an edge of the cycle
    pub fn can_transition_to(self, to: UnitStatus) -> bool {
        self.next() == to
    }

    /// Statuses in which some thread holds the unit's storage
    pub fn is_claimed(self) -> bool {
        matches!(self, UnitStatus::Filling | UnitStatus::Scanning)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitStatus::Empty => "empty",
            UnitStatus::Filling => "filling",
            UnitStatus::Filled => "filled",
            UnitStatus::Scanning => "scanning",
        };
        f.write_str(name)
    }
}

struct Slot {
    status: UnitStatus,
    length: usize,
    // None while a UnitHandle holds the block
    storage: Option<Box<[u8]>>,
}

/// Exclusive access to one claimed unit
///
/// Obtained from [`BufferPool::try_claim`] or [`BufferPool::claim`] and
/// handed back with [`BufferPool::commit`].
pub struct UnitHandle {
    index: usize,
    status: UnitStatus,
    length: usize,
    storage: Box<[u8]>,
}

impl UnitHandle {
    /// Position of the unit in the pool
    pub fn index(&self) -> usize {
        self.index
    }

    /// Status the unit was claimed into
    pub fn status(&self) -> UnitStatus {
        self.status
    }

    /// Number of valid bytes
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Full capacity of the unit
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// The valid bytes `[0, len)`
    pub fn data(&self) -> &[u8] {
        &self.storage[..self.length]
    }

    /// The whole block, for the producer to read into
    pub fn fill_buffer(&mut self) -> &mut [u8] {
        &mut self.storage
    }
}

impl fmt::Debug for UnitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitHandle")
            .field("index", &self.index)
            .field("status", &self.status)
            .field("length", &self.length)
            .field("capacity", &self.storage.len())
            .finish()
    }
}

/// Pool statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub units: usize,
    pub unit_capacity: usize,
    pub empty: usize,
    pub filling: usize,
    pub filled: usize,
    pub scanning: usize,
    pub claims: u64,
    pub commits: u64,
    /// `try_claim` scans that found nothing eligible
    pub misses: u64,
}

/// Fixed set of reusable byte blocks shared by one producer and N workers
pub struct BufferPool {
    slots: Mutex<Vec<Slot>>,
    unit_capacity: usize,
    claims: AtomicU64,
    commits: AtomicU64,
    misses: AtomicU64,
}

impl BufferPool {
    /// Allocate `units` blocks of `unit_capacity` bytes each, all Empty
    pub fn new(units: usize, unit_capacity: usize) -> Result<Self> {
        if units == 0 {
            return Err(RuwcError::invalid_configuration(
                "Buffer pool needs at least one unit",
                Some(units.to_string()),
            ));
        }
        if unit_capacity == 0 {
            return Err(RuwcError::invalid_configuration(
                "Buffer capacity must be greater than zero",
                Some(unit_capacity.to_string()),
            ));
        }
        match units.checked_mul(unit_capacity) {
            Some(total) if total <= isize::MAX as usize => {}
            _ => {
                return Err(RuwcError::invalid_configuration(
                    format!(
                        "{} units of {} bytes exceed the addressable size",
                        units, unit_capacity
                    ),
                    None,
                ))
            }
        }

        let slots = (0..units)
            .map(|_| Slot {
                status: UnitStatus::Empty,
                length: 0,
                storage: Some(vec![0u8; unit_capacity].into_boxed_slice()),
            })
            .collect();

        tracing::debug!(units, unit_capacity, "Allocated buffer pool");

        Ok(Self {
            slots: Mutex::new(slots),
            unit_capacity,
            claims: AtomicU64::new(0),
            commits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Pool sized for double buffering: [`UNITS_PER_WORKER`] units per worker
    ///
    /// [`UNITS_PER_WORKER`]: super::UNITS_PER_WORKER
    pub fn for_workers(workers: usize, unit_capacity: usize) -> Result<Self> {
        let units = workers.checked_mul(super::UNITS_PER_WORKER).ok_or_else(|| {
            RuwcError::invalid_configuration("Worker count too large", Some(workers.to_string()))
        })?;
        Self::new(units, unit_capacity)
    }

    // Critical sections never panic while slots are half-updated, so a
    // poisoned lock still guards a consistent vector.
    fn lock(&self) -> MutexGuard<'_, Vec<Slot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of units
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity of each unit in bytes
    pub fn unit_capacity(&self) -> usize {
        self.unit_capacity
    }

    /// Claim the first unit whose status is `from`, flipping it to `to`
    ///
    /// Returns `None` when no unit is eligible. Which unit wins among
    /// several eligible ones is unspecified.
    pub fn try_claim(&self, from: UnitStatus, to: UnitStatus) -> Option<UnitHandle> {
        debug_assert!(from.can_transition_to(to), "{} -> {} is not a valid claim", from, to);

        let mut slots = self.lock();
        let found = slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.status == from && slot.storage.is_some());

        match found {
            Some((index, slot)) => {
                let storage = slot.storage.take()?;
                slot.status = to;
                let length = slot.length;
                drop(slots);
                self.claims.fetch_add(1, Ordering::Relaxed);
                Some(UnitHandle {
                    index,
                    status: to,
                    length,
                    storage,
                })
            }
            None => {
                drop(slots);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Claim a specific unit, which must currently be `from`
    pub fn claim(&self, index: usize, from: UnitStatus, to: UnitStatus) -> Result<UnitHandle> {
        if !from.can_transition_to(to) {
            return Err(RuwcError::unit_state(index, from.next(), to));
        }

        let mut slots = self.lock();
        let slot = slots.get_mut(index).ok_or_else(|| {
            RuwcError::internal_error(format!("No buffer unit at index {}", index), Some(file!()))
        })?;
        if slot.status != from {
            return Err(RuwcError::unit_state(index, from, slot.status));
        }
        let storage = slot.storage.take().ok_or_else(|| {
            RuwcError::internal_error(
                format!("Buffer unit {} has no storage while {}", index, from),
                Some(file!()),
            )
        })?;
        slot.status = to;
        let length = slot.length;
        drop(slots);

        self.claims.fetch_add(1, Ordering::Relaxed);
        Ok(UnitHandle {
            index,
            status: to,
            length,
            storage,
        })
    }

    /// Return a claimed unit, moving it to `to`
    ///
    /// `length` records how many bytes are now valid; `None` keeps the old
    /// value, except that moving to Empty always resets it to zero.
    pub fn commit(&self, handle: UnitHandle, to: UnitStatus, length: Option<usize>) -> Result<()> {
        let UnitHandle {
            index,
            status,
            length: held_length,
            storage,
        } = handle;

        if !status.can_transition_to(to) {
            return Err(RuwcError::unit_state(index, status.next(), to));
        }
        if let Some(len) = length {
            if len > storage.len() {
                return Err(RuwcError::internal_error(
                    format!(
                        "Length {} exceeds capacity {} of unit {}",
                        len,
                        storage.len(),
                        index
                    ),
                    Some(file!()),
                ));
            }
        }

        self.put_back(index, status, to, length.unwrap_or(held_length), storage)
    }

    /// Return a unit the producer claimed but could not fill
    ///
    /// This is the only edge outside the cycle (`Filling -> Empty`).
    pub fn abandon(&self, handle: UnitHandle) -> Result<()> {
        let UnitHandle {
            index,
            status,
            storage,
            ..
        } = handle;

        if status != UnitStatus::Filling {
            return Err(RuwcError::unit_state(index, UnitStatus::Filling, status));
        }
        self.put_back(index, status, UnitStatus::Empty, 0, storage)
    }

    fn put_back(
        &self,
        index: usize,
        held: UnitStatus,
        to: UnitStatus,
        length: usize,
        storage: Box<[u8]>,
    ) -> Result<()> {
        let mut slots = self.lock();
        let slot = slots.get_mut(index).ok_or_else(|| {
            RuwcError::internal_error(format!("No buffer unit at index {}", index), Some(file!()))
        })?;
        if slot.status != held || slot.storage.is_some() {
            return Err(RuwcError::unit_state(index, held, slot.status));
        }

        slot.status = to;
        slot.length = if to == UnitStatus::Empty { 0 } else { length };
        slot.storage = Some(storage);
        drop(slots);

        self.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Current status of one unit
    pub fn status(&self, index: usize) -> Option<UnitStatus> {
        self.lock().get(index).map(|slot| slot.status)
    }

    /// Statuses of all units, in pool order
    pub fn snapshot(&self) -> Vec<UnitStatus> {
        self.lock().iter().map(|slot| slot.status).collect()
    }

    /// Count of units currently in `status`
    pub fn count_in(&self, status: UnitStatus) -> usize {
        self.lock().iter().filter(|slot| slot.status == status).count()
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        let mut stats = PoolStats {
            unit_capacity: self.unit_capacity,
            claims: self.claims.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            ..PoolStats::default()
        };

        let slots = self.lock();
        stats.units = slots.len();
        for slot in slots.iter() {
            match slot.status {
                UnitStatus::Empty => stats.empty += 1,
                UnitStatus::Filling => stats.filling += 1,
                UnitStatus::Filled => stats.filled += 1,
                UnitStatus::Scanning => stats.scanning += 1,
            }
        }
        stats
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("units", &self.len())
            .field("unit_capacity", &self.unit_capacity)
            .finish()
    }
}
