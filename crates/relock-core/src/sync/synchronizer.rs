//! Queue-based blocking synchronizer
//!
//! A synchronizer owns a single atomic `u32` state word and a FIFO queue of
//! parked threads. It never decides by itself whether an acquisition may
//! proceed: that is delegated to the `ExclusiveHooks` of the primitive built
//! on top of it, which read and mutate the state word.

use crate::sync::waiter::Waiter;
use crate::sync::OwnerId;
use crate::LockResult;
use parking_lot::Mutex as ParkingLotMutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Decision hooks a synchronizer calls to acquire and release exclusively
pub trait ExclusiveHooks {
    /// Attempt to acquire `arg` units without blocking.
    ///
    /// Returns:
    /// - Ok(true) if acquired
    /// - Ok(false) if the caller must wait
    /// - Err(LockError) if the attempt is invalid and must be abandoned
    fn try_acquire(&self, arg: u32) -> LockResult<bool>;

    /// Release `arg` units.
    ///
    /// Returns:
    /// - Ok(true) if the resource is now fully released and a waiter may proceed
    /// - Ok(false) if it is still held
    /// - Err(LockError) if the release is invalid
    fn try_release(&self, arg: u32) -> LockResult<bool>;
}

/// Blocking synchronizer capability
///
/// Implementations must make `state` writes performed by a release visible to
/// any thread that is subsequently woken from `acquire`.
pub trait Synchronizer: Send + Sync {
    /// Current state
    fn state(&self) -> u32;

    /// Unconditionally store a new state
    fn set_state(&self, state: u32);

    /// Atomically set the state to `update` if it currently equals `expect`
    fn compare_and_set_state(&self, expect: u32, update: u32) -> bool;

    /// Acquire, blocking until `hooks.try_acquire(arg)` succeeds
    fn acquire<H>(&self, hooks: &H, arg: u32) -> LockResult<()>
    where
        H: ExclusiveHooks + ?Sized;

    /// Release through `hooks.try_release(arg)`, waking a waiter on full release
    ///
    /// Returns whether the resource was fully released.
    fn release<H>(&self, hooks: &H, arg: u32) -> LockResult<bool>
    where
        H: ExclusiveHooks + ?Sized;

    /// Whether any thread is parked waiting to acquire
    fn has_queued_threads(&self) -> bool {
        self.queue_length() > 0
    }

    /// Number of parked threads
    fn queue_length(&self) -> usize;

    /// Parked threads, head of the queue first
    fn queued_owners(&self) -> Vec<OwnerId>;
}

/// Synchronizer backed by an atomic state word and a FIFO queue of waiters
///
/// Acquisition is non-fair: a caller first tries the hook without looking at
/// the queue, so it can overtake threads that are already parked. A release
/// that fully frees the resource wakes exactly the head of the queue, which
/// then competes like any other caller.
pub struct QueuedSynchronizer {
    /// Synchronization state, interpreted by the hooks
    state: AtomicU32,

    /// FIFO wait queue of parked threads
    queue: ParkingLotMutex<VecDeque<Arc<Waiter>>>,
}

impl QueuedSynchronizer {
    /// Create a synchronizer with state 0 and an empty queue
    pub fn new() -> Self {
        Self {
            state: AtomicU32::new(0),
            queue: ParkingLotMutex::new(VecDeque::new()),
        }
    }

    #[cold]
    fn acquire_queued<H>(&self, hooks: &H, arg: u32) -> LockResult<()>
    where
        H: ExclusiveHooks + ?Sized,
    {
        let waiter = Arc::new(Waiter::new());
        let mut woken = false;

        loop {
            // Enqueue before re-checking: a release that misses us in the
            // queue has already published its state, and the re-check sees it.
            // A woken waiter that lost to a barging thread goes back to the head.
            let mut queue = self.queue.lock();
            if woken {
                queue.push_front(Arc::clone(&waiter));
            } else {
                queue.push_back(Arc::clone(&waiter));
            }
            drop(queue);

            let attempt = hooks.try_acquire(arg);
            if !matches!(attempt, Ok(false)) {
                let still_queued = self.remove(&waiter);
                if attempt.is_err() && !still_queued {
                    // A release popped us for a wakeup we are not going to use.
                    self.signal_next();
                }
                return attempt.map(|_| ());
            }

            log::trace!("{} parking ({} queued)", waiter.owner(), self.queue_length());
            waiter.park();
            woken = true;
            log::trace!("{} woken", waiter.owner());
        }
    }

    /// Remove `waiter` from the queue. Returns false if it was no longer queued.
    fn remove(&self, waiter: &Arc<Waiter>) -> bool {
        let mut queue = self.queue.lock();
        match queue.iter().position(|queued| Arc::ptr_eq(queued, waiter)) {
            Some(index) => {
                queue.remove(index);
                true
            }
            None => false,
        }
    }

    /// Wake the head of the queue, if any
    fn signal_next(&self) {
        let next = self.queue.lock().pop_front();
        if let Some(waiter) = next {
            log::trace!("waking {}", waiter.owner());
            waiter.unpark();
        }
    }
}

impl Default for QueuedSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Synchronizer for QueuedSynchronizer {
    fn state(&self) -> u32 {
        self.state.load(Ordering::Acquire)
    }

    fn set_state(&self, state: u32) {
        self.state.store(state, Ordering::Release);
    }

    fn compare_and_set_state(&self, expect: u32, update: u32) -> bool {
        self.state
            .compare_exchange(expect, update, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn acquire<H>(&self, hooks: &H, arg: u32) -> LockResult<()>
    where
        H: ExclusiveHooks + ?Sized,
    {
        if hooks.try_acquire(arg)? {
            // Quick path
            return Ok(());
        }
        self.acquire_queued(hooks, arg)
    }

    fn release<H>(&self, hooks: &H, arg: u32) -> LockResult<bool>
    where
        H: ExclusiveHooks + ?Sized,
    {
        let free = hooks.try_release(arg)?;
        if free {
            self.signal_next();
        }
        Ok(free)
    }

    fn queue_length(&self) -> usize {
        self.queue.lock().len()
    }

    fn queued_owners(&self) -> Vec<OwnerId> {
        self.queue.lock().iter().map(|waiter| waiter.owner()).collect()
    }
}

impl std::fmt::Debug for QueuedSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedSynchronizer")
            .field("state", &self.state())
            .field("queued", &self.queue_length())
            .finish()
    }
}
