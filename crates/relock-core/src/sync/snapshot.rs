//! Point-in-time view of a lock

use crate::sync::{LockId, OwnerId};
use std::fmt;

/// Captured state of a ReentrantLock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSnapshot {
    /// Lock ID
    pub lock_id: LockId,
    /// Current owner (None if unlocked)
    pub owner: Option<OwnerId>,
    /// Outstanding holds of the owner
    pub hold_count: u32,
    /// FIFO wait queue of parked threads
    pub wait_queue: Vec<OwnerId>,
}

impl LockSnapshot {
    /// Whether the owner and hold count agree: an owner is recorded iff the
    /// hold count is non-zero.
    ///
    /// A snapshot taken while another thread is between its state transition
    /// and its owner update can legitimately fail this check.
    pub fn is_consistent(&self) -> bool {
        self.owner.is_some() == (self.hold_count > 0)
    }
}

impl fmt::Display for LockSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.owner {
            Some(owner) => write!(f, "{}: held by {} x{}", self.lock_id, owner, self.hold_count)?,
            None => write!(f, "{}: free", self.lock_id)?,
        }
        if !self.wait_queue.is_empty() {
            write!(f, ", {} waiting", self.wait_queue.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_snapshot() {
        let snapshot = LockSnapshot {
            lock_id: LockId::new(),
            owner: None,
            hold_count: 0,
            wait_queue: Vec::new(),
        };

        assert!(snapshot.is_consistent());
        assert_eq!(snapshot.to_string(), format!("{}: free", snapshot.lock_id));
    }

    #[test]
    fn test_held_snapshot() {
        let owner = OwnerId::current();
        let snapshot = LockSnapshot {
            lock_id: LockId::new(),
            owner: Some(owner),
            hold_count: 2,
            wait_queue: vec![owner],
        };

        assert!(snapshot.is_consistent());
        assert_eq!(
            snapshot.to_string(),
            format!("{}: held by {} x2, 1 waiting", snapshot.lock_id, owner)
        );
    }

    #[test]
    fn test_inconsistent_snapshot() {
        let snapshot = LockSnapshot {
            lock_id: LockId::new(),
            owner: None,
            hold_count: 1,
            wait_queue: Vec::new(),
        };

        assert!(!snapshot.is_consistent());
    }
}
