//! Reentrant locking on top of a queue-based blocking synchronizer
//!
//! The synchronizer owns the atomic state word and the wait queue; the lock
//! layers reentrancy and owner tracking on it through `ExclusiveHooks`.

mod guard;
mod holder;
mod lock_id;
mod owner;
mod reentrant;
mod snapshot;
mod synchronizer;
mod waiter;

pub use guard::{OwnedReentrantLockGuard, ReentrantLockGuard};
pub use holder::{exclusive_lock, LockHolder};
pub use lock_id::LockId;
pub use owner::OwnerId;
pub use reentrant::ReentrantLock;
pub use snapshot::LockSnapshot;
pub use synchronizer::{ExclusiveHooks, QueuedSynchronizer, Synchronizer};
