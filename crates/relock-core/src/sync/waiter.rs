//! Park/unpark slot for a thread queued on a synchronizer

use crate::sync::OwnerId;
use parking_lot::{Condvar, Mutex};

/// A queued thread
///
/// Holds a single wake permit. `unpark` grants it, `park` blocks until it is
/// granted and consumes it, so a wake that arrives before the park is never
/// lost and spurious condvar wakeups are absorbed.
pub(crate) struct Waiter {
    /// Thread that created this waiter
    owner: OwnerId,
    /// Pending wake permit
    permit: Mutex<bool>,
    /// Condvar the owning thread sleeps on
    wakeup: Condvar,
}

impl Waiter {
    /// Create a waiter for the calling thread
    pub(crate) fn new() -> Self {
        Self {
            owner: OwnerId::current(),
            permit: Mutex::new(false),
            wakeup: Condvar::new(),
        }
    }

    /// Thread this waiter belongs to
    pub(crate) fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Block until a permit is available, then consume it
    pub(crate) fn park(&self) {
        let mut permit = self.permit.lock();
        while !*permit {
            self.wakeup.wait(&mut permit);
        }
        *permit = false;
    }

    /// Grant the permit and wake the owning thread if it is parked
    pub(crate) fn unpark(&self) {
        let mut permit = self.permit.lock();
        *permit = true;
        self.wakeup.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_unpark_before_park_is_not_lost() {
        let waiter = Waiter::new();
        waiter.unpark();
        waiter.park();
        assert!(!*waiter.permit.lock());
    }

    #[test]
    fn test_park_blocks_until_unpark() {
        let waiter = Arc::new(Waiter::new());
        let parked = Arc::clone(&waiter);

        let handle = thread::spawn(move || {
            parked.park();
            parked.owner()
        });

        thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());

        waiter.unpark();
        let owner = handle.join().unwrap();
        assert_eq!(owner, OwnerId::current());
    }
}
