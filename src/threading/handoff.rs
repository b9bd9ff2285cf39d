//! Moving buffer units between the producer and the workers
//!
//! Both strategies drive the same pool state machine; they only differ in
//! how an idle thread finds its next unit.
//!
//! ```text
//! Polling:  claim = lock pool, first unit in the wanted status, else sleep
//! Channel:  claim = recv unit index from a bounded queue, then flip it
//!
//!   producer ──(filled indices)──▶ workers
//!   producer ◀──(empty indices)─── workers
//! ```

use super::{OperationState, ShutdownPolicy, ThreadResult};
use crate::error::RuwcError;
use crate::memory::{BufferPool, UnitHandle, UnitStatus};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// The producer's view of the hand-off
pub trait ProducerSide {
    /// Next Empty unit, already flipped to Filling, or `None` once the run
    /// is stopping
    fn claim_empty(&mut self) -> ThreadResult<Option<UnitHandle>>;

    /// Mark a unit Filled with `len` valid bytes and make it visible to workers
    fn publish(&mut self, handle: UnitHandle, len: usize) -> ThreadResult<()>;

    /// Give back a unit the producer claimed but could not fill
    fn abandon(&mut self, handle: UnitHandle) -> ThreadResult<()>;

    /// No more units will be published
    fn finish(&mut self);
}

/// A worker's view of the hand-off
pub trait WorkerSide: Send {
    /// Next Filled unit, already flipped to Scanning, or `None` when this
    /// worker should exit
    fn claim_filled(&mut self) -> ThreadResult<Option<UnitHandle>>;

    /// Return a scanned unit as Empty
    fn release(&mut self, handle: UnitHandle) -> ThreadResult<()>;
}

fn abandon_with_policy(
    pool: &BufferPool,
    shutdown: ShutdownPolicy,
    handle: UnitHandle,
) -> ThreadResult<()> {
    match shutdown {
        ShutdownPolicy::Drain => pool.abandon(handle),
        ShutdownPolicy::BestEffort => {
            // The unit stays Filling with no storage until the pool is dropped
            tracing::trace!(unit = handle.index(), "Leaving unfilled unit claimed");
            drop(handle);
            Ok(())
        }
    }
}

/// Lock-and-scan hand-off with a fixed sleep between attempts
#[derive(Clone)]
pub struct PollingHandOff {
    pool: Arc<BufferPool>,
    state: Arc<OperationState>,
    shutdown: ShutdownPolicy,
    interval: Duration,
}

impl PollingHandOff {
    pub fn new(
        pool: Arc<BufferPool>,
        state: Arc<OperationState>,
        shutdown: ShutdownPolicy,
        interval: Duration,
    ) -> Self {
        Self {
            pool,
            state,
            shutdown,
            interval,
        }
    }
}

impl ProducerSide for PollingHandOff {
    fn claim_empty(&mut self) -> ThreadResult<Option<UnitHandle>> {
        loop {
            if !self.state.is_running() {
                return Ok(None);
            }
            if let Some(handle) = self.pool.try_claim(UnitStatus::Empty, UnitStatus::Filling) {
                return Ok(Some(handle));
            }
            thread::sleep(self.interval);
            self.state.add_resting(self.interval);
        }
    }

    fn publish(&mut self, handle: UnitHandle, len: usize) -> ThreadResult<()> {
        self.pool.commit(handle, UnitStatus::Filled, Some(len))
    }

    fn abandon(&mut self, handle: UnitHandle) -> ThreadResult<()> {
        abandon_with_policy(&self.pool, self.shutdown, handle)
    }

    fn finish(&mut self) {}
}

impl WorkerSide for PollingHandOff {
    fn claim_filled(&mut self) -> ThreadResult<Option<UnitHandle>> {
        loop {
            if !self.state.is_running() {
                return Ok(None);
            }
            // Read the flag before scanning: once it is set every Filled
            // commit is already visible under the pool lock.
            let done = self.state.input_done();
            if let Some(handle) = self.pool.try_claim(UnitStatus::Filled, UnitStatus::Scanning) {
                return Ok(Some(handle));
            }
            if done {
                return Ok(None);
            }
            thread::sleep(self.interval);
            self.state.add_starving(self.interval);
        }
    }

    fn release(&mut self, handle: UnitHandle) -> ThreadResult<()> {
        self.pool.commit(handle, UnitStatus::Empty, None)
    }
}

/// Create the channel pair for a pool and seed it with every unit
pub fn channel_pair(
    pool: Arc<BufferPool>,
    state: Arc<OperationState>,
    shutdown: ShutdownPolicy,
) -> (ChannelProducer, ChannelWorker) {
    let units = pool.len();
    let (empty_tx, empty_rx) = crossbeam_channel::bounded(units);
    let (filled_tx, filled_rx) = crossbeam_channel::bounded(units);

    for index in 0..units {
        // Capacity equals the unit count, so this never blocks or fails
        let _ = empty_tx.send(index);
    }

    let producer = ChannelProducer {
        pool: Arc::clone(&pool),
        state: Arc::clone(&state),
        shutdown,
        empty_rx,
        filled_tx: Some(filled_tx),
    };
    let worker = ChannelWorker {
        pool,
        state,
        filled_rx,
        empty_tx,
    };
    (producer, worker)
}

/// Producer end of the bounded queue pair
pub struct ChannelProducer {
    pool: Arc<BufferPool>,
    state: Arc<OperationState>,
    shutdown: ShutdownPolicy,
    empty_rx: Receiver<usize>,
    // Dropped by finish() so workers see a disconnect once drained
    filled_tx: Option<Sender<usize>>,
}

impl ProducerSide for ChannelProducer {
    fn claim_empty(&mut self) -> ThreadResult<Option<UnitHandle>> {
        if !self.state.is_running() {
            return Ok(None);
        }

        let started = Instant::now();
        let received = self.empty_rx.recv();
        self.state.add_resting(started.elapsed());

        match received {
            Ok(index) => self
                .pool
                .claim(index, UnitStatus::Empty, UnitStatus::Filling)
                .map(Some),
            // Every worker is gone
            Err(_) => Ok(None),
        }
    }

    fn publish(&mut self, handle: UnitHandle, len: usize) -> ThreadResult<()> {
        let index = handle.index();
        self.pool.commit(handle, UnitStatus::Filled, Some(len))?;

        let sender = self.filled_tx.as_ref().ok_or_else(|| {
            RuwcError::internal_error("Unit published after producer finished", Some(file!()))
        })?;
        sender.send(index).map_err(|_| {
            RuwcError::internal_error("No worker left to scan filled units", Some(file!()))
        })
    }

    fn abandon(&mut self, handle: UnitHandle) -> ThreadResult<()> {
        abandon_with_policy(&self.pool, self.shutdown, handle)
    }

    fn finish(&mut self) {
        self.filled_tx.take();
    }
}

/// Worker end of the bounded queue pair; clone one per worker
#[derive(Clone)]
pub struct ChannelWorker {
    pool: Arc<BufferPool>,
    state: Arc<OperationState>,
    filled_rx: Receiver<usize>,
    empty_tx: Sender<usize>,
}

impl WorkerSide for ChannelWorker {
    fn claim_filled(&mut self) -> ThreadResult<Option<UnitHandle>> {
        if !self.state.is_running() {
            return Ok(None);
        }

        let started = Instant::now();
        let received = self.filled_rx.recv();
        self.state.add_starving(started.elapsed());

        match received {
            Ok(index) => self
                .pool
                .claim(index, UnitStatus::Filled, UnitStatus::Scanning)
                .map(Some),
            // Producer finished and the queue is drained
            Err(_) => Ok(None),
        }
    }

    fn release(&mut self, handle: UnitHandle) -> ThreadResult<()> {
        let index = handle.index();
        self.pool.commit(handle, UnitStatus::Empty, None)?;
        // The producer may already be gone at shutdown
        let _ = self.empty_tx.send(index);
        Ok(())
    }
}
