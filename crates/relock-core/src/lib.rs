//! Relock Core
//!
//! This crate provides a reentrant exclusive lock layered on a queue-based
//! blocking synchronizer:
//! - `Synchronizer` / `ExclusiveHooks` (atomic state, FIFO wait queue, park/unpark)
//! - `ReentrantLock` (non-fair, owner-tracking, nestable)
//! - `LockHolder` (lazily created, process-wide lock instance)

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod sync;

pub use sync::{
    exclusive_lock, ExclusiveHooks, LockHolder, LockId, LockSnapshot, OwnedReentrantLockGuard,
    OwnerId, QueuedSynchronizer, ReentrantLock, ReentrantLockGuard, Synchronizer,
};

/// Lock usage errors
///
/// Every variant is a caller bug surfaced immediately; none of them are
/// worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LockError {
    /// Reentrant acquisition would push the hold count past `u32::MAX`
    #[error("Hold count overflow: {held} + {requested} exceeds u32::MAX")]
    Overflow {
        /// Hold count before the failed acquisition
        held: u32,
        /// Increment that was requested
        requested: u32,
    },

    /// Release that does not match an outstanding acquisition
    #[error("Illegal release: {0}")]
    IllegalRelease(ReleaseFault),
}

/// Why a release was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReleaseFault {
    /// The calling thread does not hold the lock
    #[error("Not owner: {caller} released a lock held by {owner:?}")]
    NotOwner {
        /// Thread that attempted the release
        caller: OwnerId,
        /// Thread currently holding the lock, if any
        owner: Option<OwnerId>,
    },

    /// The owner tried to release more holds than it has
    #[error("Release of {requested} exceeds hold count {held}")]
    ExceedsHoldCount {
        /// Current hold count
        held: u32,
        /// Decrement that was requested
        requested: u32,
    },
}

/// Lock operation result
pub type LockResult<T> = Result<T, LockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let overflow = LockError::Overflow {
            held: u32::MAX,
            requested: 1,
        };
        assert_eq!(
            overflow.to_string(),
            format!("Hold count overflow: {} + 1 exceeds u32::MAX", u32::MAX)
        );

        let excess = LockError::IllegalRelease(ReleaseFault::ExceedsHoldCount {
            held: 2,
            requested: 3,
        });
        assert_eq!(
            excess.to_string(),
            "Illegal release: Release of 3 exceeds hold count 2"
        );

        let caller = OwnerId::current();
        let not_owner = LockError::IllegalRelease(ReleaseFault::NotOwner {
            caller,
            owner: None,
        });
        assert_eq!(
            not_owner.to_string(),
            format!("Illegal release: Not owner: {} released a lock held by None", caller)
        );
    }
}
