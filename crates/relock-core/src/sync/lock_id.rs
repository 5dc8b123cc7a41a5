//! Unique identifier for locks

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a ReentrantLock
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LockId(u64);

static NEXT_LOCK_ID: AtomicU64 = AtomicU64::new(1);

impl LockId {
    /// Generate a new unique LockId
    pub fn new() -> Self {
        LockId(NEXT_LOCK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric ID value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Default for LockId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lock#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_id_uniqueness() {
        let id1 = LockId::new();
        let id2 = LockId::new();
        assert_ne!(id1, id2);
        assert!(id2.as_u64() > id1.as_u64());
    }

    #[test]
    fn test_lock_id_display() {
        let id = LockId::new();
        assert_eq!(id.to_string(), format!("lock#{}", id.as_u64()));
    }
}
