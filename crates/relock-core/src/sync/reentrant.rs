//! Reentrant exclusive lock

use crate::sync::{
    ExclusiveHooks, LockId, LockSnapshot, OwnedReentrantLockGuard, OwnerId, QueuedSynchronizer,
    ReentrantLockGuard, Synchronizer,
};
use crate::{LockError, LockResult, ReleaseFault};
use crossbeam::atomic::AtomicCell;
use std::fmt;
use std::sync::Arc;

/// Reentrant mutual-exclusion lock
///
/// The synchronizer state is the hold count: 0 means unlocked, `n > 0` means
/// the owner has acquired `n` more times than it has released. The owning
/// thread may acquire again without blocking; every other thread parks until
/// the hold count returns to 0.
///
/// The lock is non-fair. A thread arriving while the lock happens to be free
/// takes it even if other threads are already queued.
///
/// The lock does not protect data by itself; it serializes whatever the
/// callers do between `lock` and `unlock`.
pub struct ReentrantLock<S = QueuedSynchronizer>
where
    S: Synchronizer,
{
    /// Unique lock ID
    id: LockId,

    /// Owner and synchronizer, driven only through the synchronizer
    core: Exclusive<S>,
}

/// Hook side of the lock
///
/// Kept private so the hooks can only run inside the synchronizer's
/// acquire/release, which pair a full release with a wakeup.
struct Exclusive<S> {
    /// Current owner thread (None iff the hold count is 0)
    owner: AtomicCell<Option<OwnerId>>,

    /// Hold count and wait queue
    sync: S,
}

impl ReentrantLock {
    /// Create an unlocked lock backed by a `QueuedSynchronizer`
    pub fn new() -> Self {
        Self::with_synchronizer(QueuedSynchronizer::new())
    }
}

impl Default for ReentrantLock {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> ReentrantLock<S>
where
    S: Synchronizer,
{
    /// Create an unlocked lock on top of the given synchronizer
    ///
    /// The synchronizer must start with state 0 and must not be shared with
    /// another primitive.
    pub fn with_synchronizer(sync: S) -> Self {
        debug_assert_eq!(sync.state(), 0, "synchronizer must start unlocked");
        Self {
            id: LockId::new(),
            core: Exclusive {
                owner: AtomicCell::new(None),
                sync,
            },
        }
    }

    /// Get the lock ID
    pub fn id(&self) -> LockId {
        self.id
    }

    /// Block until the calling thread holds the lock
    ///
    /// Returns immediately if the caller already owns it, incrementing the
    /// hold count. Fails only with `LockError::Overflow`.
    pub fn lock(&self) -> LockResult<()> {
        self.acquire(1)
    }

    /// Release one hold
    ///
    /// Wakes a waiting thread when the hold count reaches 0. Fails with
    /// `LockError::IllegalRelease` if the caller does not hold the lock.
    pub fn unlock(&self) -> LockResult<()> {
        self.release(1)
    }

    /// Block until the caller holds the lock, adding `count` holds
    ///
    /// A `count` of 0 is a no-op.
    pub fn acquire(&self, count: u32) -> LockResult<()> {
        if count == 0 {
            return Ok(());
        }
        self.core.sync.acquire(&self.core, count)
    }

    /// Remove `count` holds, fully releasing the lock when none remain
    ///
    /// A `count` of 0 is a no-op.
    pub fn release(&self, count: u32) -> LockResult<()> {
        if count == 0 {
            return Ok(());
        }
        let free = self.core.sync.release(&self.core, count)?;
        if free {
            log::trace!("{} released by {}", self.id, OwnerId::current());
        }
        Ok(())
    }

    /// Acquire the lock only if it is free or already held by the caller
    ///
    /// Never blocks or queues. Returns:
    /// - Ok(true) if the caller now holds the lock
    /// - Ok(false) if another thread holds it
    pub fn try_lock(&self) -> LockResult<bool> {
        self.core.try_acquire(1)
    }

    /// Lock and return a guard that unlocks on drop
    pub fn lock_guard(&self) -> LockResult<ReentrantLockGuard<'_, S>> {
        self.lock()?;
        Ok(ReentrantLockGuard::new(self))
    }

    /// Lock and return a guard that keeps the lock alive
    pub fn lock_owned(self: &Arc<Self>) -> LockResult<OwnedReentrantLockGuard<S>> {
        self.lock()?;
        Ok(OwnedReentrantLockGuard::new(Arc::clone(self)))
    }

    /// Check current owner
    pub fn owner(&self) -> Option<OwnerId> {
        self.core.owner.load()
    }

    /// Check if any thread holds the lock
    pub fn is_locked(&self) -> bool {
        self.core.sync.state() != 0
    }

    /// Check if the calling thread holds the lock
    pub fn is_held_by_current_thread(&self) -> bool {
        self.core.owner.load() == Some(OwnerId::current())
    }

    /// Holds owned by the calling thread (0 if it is not the owner)
    pub fn hold_count(&self) -> u32 {
        if self.is_held_by_current_thread() {
            self.core.sync.state()
        } else {
            0
        }
    }

    /// Check whether threads are parked waiting for the lock
    pub fn has_queued_threads(&self) -> bool {
        self.core.sync.has_queued_threads()
    }

    /// Get number of parked threads
    pub fn queue_length(&self) -> usize {
        self.core.sync.queue_length()
    }

    /// Capture the current lock state
    ///
    /// Fields are read one after another, so under contention the result
    /// may mix states from different instants.
    pub fn snapshot(&self) -> LockSnapshot {
        LockSnapshot {
            lock_id: self.id,
            owner: self.core.owner.load(),
            hold_count: self.core.sync.state(),
            wait_queue: self.core.sync.queued_owners(),
        }
    }
}

impl<S> ExclusiveHooks for Exclusive<S>
where
    S: Synchronizer,
{
    fn try_acquire(&self, acquires: u32) -> LockResult<bool> {
        let current = OwnerId::current();
        let held = self.sync.state();

        if held == 0 {
            // Free: race other callers, queued or not, for the 0 -> n transition
            if self.sync.compare_and_set_state(0, acquires) {
                self.owner.store(Some(current));
                return Ok(true);
            }
        } else if self.owner.load() == Some(current) {
            // Reentrant acquisition: only the owner writes the state while held
            let next = held.checked_add(acquires).ok_or(LockError::Overflow {
                held,
                requested: acquires,
            })?;
            self.sync.set_state(next);
            return Ok(true);
        }

        Ok(false)
    }

    fn try_release(&self, releases: u32) -> LockResult<bool> {
        let caller = OwnerId::current();
        let owner = self.owner.load();
        if owner != Some(caller) {
            return Err(LockError::IllegalRelease(ReleaseFault::NotOwner {
                caller,
                owner,
            }));
        }

        let held = self.sync.state();
        let next = held.checked_sub(releases).ok_or(LockError::IllegalRelease(
            ReleaseFault::ExceedsHoldCount {
                held,
                requested: releases,
            },
        ))?;

        // Clear the owner before publishing 0 so that whoever observes the
        // free state also observes no owner.
        let free = next == 0;
        if free {
            self.owner.store(None);
        }
        self.sync.set_state(next);
        Ok(free)
    }
}

impl<S> fmt::Debug for ReentrantLock<S>
where
    S: Synchronizer,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReentrantLock")
            .field("id", &self.id)
            .field("owner", &self.core.owner.load())
            .field("hold_count", &self.core.sync.state())
            .field("queued", &self.core.sync.queue_length())
            .finish()
    }
}
