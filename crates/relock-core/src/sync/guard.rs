//! RAII guards for automatic unlock

use crate::sync::{ReentrantLock, Synchronizer};
use crate::LockResult;
use std::marker::PhantomData;
use std::sync::Arc;

/// RAII guard for ReentrantLock (auto-unlocks on drop)
///
/// Each guard accounts for exactly one hold, so nested guards on the same
/// thread unwind in reverse order. Guards cannot leave the thread that
/// acquired them, since only the owner may release.
#[derive(Debug)]
pub struct ReentrantLockGuard<'a, S>
where
    S: Synchronizer,
{
    /// Reference to the lock
    lock: &'a ReentrantLock<S>,
    /// Whether the guard has been manually unlocked
    unlocked: bool,
    _not_send: PhantomData<*const ()>,
}

impl<'a, S> ReentrantLockGuard<'a, S>
where
    S: Synchronizer,
{
    /// The caller must already hold one acquisition of `lock` that this
    /// guard takes over.
    pub(crate) fn new(lock: &'a ReentrantLock<S>) -> Self {
        Self {
            lock,
            unlocked: false,
            _not_send: PhantomData,
        }
    }

    /// Manually unlock early (before drop), reporting any release error
    pub fn unlock(mut self) -> LockResult<()> {
        self.unlocked = true;
        self.lock.unlock()
    }

    /// Get a reference to the lock
    pub fn lock(&self) -> &ReentrantLock<S> {
        self.lock
    }
}

impl<S> Drop for ReentrantLockGuard<'_, S>
where
    S: Synchronizer,
{
    fn drop(&mut self) {
        if !self.unlocked {
            if let Err(err) = self.lock.unlock() {
                log::warn!("{}: guard release failed: {}", self.lock.id(), err);
            }
        }
    }
}

/// RAII guard for Arc<ReentrantLock> (owned version)
///
/// This version owns an Arc to the lock, allowing it to outlive
/// the original lock reference.
pub struct OwnedReentrantLockGuard<S>
where
    S: Synchronizer,
{
    /// Arc to the lock
    lock: Arc<ReentrantLock<S>>,
    /// Whether the guard has been manually unlocked
    unlocked: bool,
    _not_send: PhantomData<*const ()>,
}

impl<S> OwnedReentrantLockGuard<S>
where
    S: Synchronizer,
{
    pub(crate) fn new(lock: Arc<ReentrantLock<S>>) -> Self {
        Self {
            lock,
            unlocked: false,
            _not_send: PhantomData,
        }
    }

    /// Manually unlock early (before drop), reporting any release error
    pub fn unlock(mut self) -> LockResult<()> {
        self.unlocked = true;
        self.lock.unlock()
    }

    /// Get a reference to the lock
    pub fn lock(&self) -> &Arc<ReentrantLock<S>> {
        &self.lock
    }
}

impl<S> Drop for OwnedReentrantLockGuard<S>
where
    S: Synchronizer,
{
    fn drop(&mut self) {
        if !self.unlocked {
            if let Err(err) = self.lock.unlock() {
                log::warn!("{}: guard release failed: {}", self.lock.id(), err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_guard_auto_unlock() {
        let lock = ReentrantLock::new();

        {
            let _guard = lock.lock_guard().unwrap();
            assert!(lock.is_locked());
            assert!(lock.is_held_by_current_thread());
        } // Guard dropped here

        assert!(!lock.is_locked());
    }

    #[test]
    fn test_nested_guards_unwind() {
        let lock = ReentrantLock::new();

        let outer = lock.lock_guard().unwrap();
        {
            let _inner = lock.lock_guard().unwrap();
            assert_eq!(lock.hold_count(), 2);
        }
        assert_eq!(lock.hold_count(), 1);
        assert!(outer.lock().is_locked());

        drop(outer);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_guard_manual_unlock() {
        let lock = ReentrantLock::new();

        let guard = lock.lock_guard().unwrap();
        guard.unlock().unwrap();

        // Drop after a manual unlock releases nothing further
        assert!(!lock.is_locked());
        assert!(lock.unlock().is_err());
    }

    #[test]
    fn test_guard_drop_wakes_waiter() {
        let lock = ReentrantLock::new();
        let guard = lock.lock_guard().unwrap();

        thread::scope(|s| {
            let waiter = s.spawn(|| {
                let _guard = lock.lock_guard().unwrap();
                lock.is_held_by_current_thread()
            });

            while lock.queue_length() == 0 {
                thread::sleep(Duration::from_millis(1));
            }
            drop(guard);

            assert!(waiter.join().unwrap());
        });

        assert!(!lock.is_locked());
    }

    #[test]
    fn test_owned_guard() {
        let lock = Arc::new(ReentrantLock::new());

        {
            let guard = lock.lock_owned().unwrap();
            assert!(Arc::ptr_eq(guard.lock(), &lock));
            assert!(lock.is_locked());
        } // Guard dropped here

        assert!(!lock.is_locked());
    }

    #[test]
    fn test_owned_guard_manual_unlock() {
        let lock = Arc::new(ReentrantLock::new());

        let guard = lock.lock_owned().unwrap();
        assert_eq!(Arc::strong_count(&lock), 2);

        guard.unlock().unwrap();
        assert!(!lock.is_locked());
        assert_eq!(Arc::strong_count(&lock), 1);
    }
}
