//! Lazily created, shared lock instance

use crate::sync::ReentrantLock;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Holds one ReentrantLock, created on first request
///
/// Concurrent first calls race inside the cell; exactly one constructor runs
/// and every caller receives that instance. The lock is published only once
/// it is fully constructed.
#[derive(Debug, Default)]
pub struct LockHolder {
    lock: OnceCell<Arc<ReentrantLock>>,
}

impl LockHolder {
    /// Create an empty holder
    pub const fn new() -> Self {
        Self {
            lock: OnceCell::new(),
        }
    }

    /// Get the held lock, creating it on first call
    pub fn get_lock(&self) -> Arc<ReentrantLock> {
        Arc::clone(self.lock.get_or_init(|| {
            let lock = ReentrantLock::new();
            log::debug!("created shared exclusive lock {}", lock.id());
            Arc::new(lock)
        }))
    }

    /// Check whether the lock has been created yet
    pub fn is_initialized(&self) -> bool {
        self.lock.get().is_some()
    }
}

static EXCLUSIVE_LOCK: LockHolder = LockHolder::new();

/// The process-wide exclusive lock
///
/// Every call, from any thread, returns the same instance.
pub fn exclusive_lock() -> Arc<ReentrantLock> {
    EXCLUSIVE_LOCK.get_lock()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_holder_starts_empty() {
        let holder = LockHolder::new();
        assert!(!holder.is_initialized());

        let lock = holder.get_lock();
        assert!(holder.is_initialized());
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_holder_returns_same_instance() {
        let holder = LockHolder::new();

        let first = holder.get_lock();
        let second = holder.get_lock();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.id(), second.id());
    }

    #[test]
    fn test_concurrent_first_access_yields_one_instance() {
        const THREADS: usize = 16;
        let holder = LockHolder::new();
        let barrier = Barrier::new(THREADS);

        let locks: Vec<Arc<ReentrantLock>> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        holder.get_lock()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for lock in &locks[1..] {
            assert!(Arc::ptr_eq(&locks[0], lock));
        }
    }

    #[test]
    fn test_exclusive_lock_is_global() {
        let here = exclusive_lock();
        let there = thread::spawn(exclusive_lock).join().unwrap();
        assert!(Arc::ptr_eq(&here, &there));
    }

    #[test]
    fn test_holders_are_independent() {
        let a = LockHolder::new();
        let b = LockHolder::new();
        assert_ne!(a.get_lock().id(), b.get_lock().id());
    }
}
