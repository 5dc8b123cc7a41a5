//! Per-thread owner identity

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of the thread that holds a lock
///
/// Each OS thread gets one id the first time it asks for it and keeps it
/// until it exits. Ids are never reused within a process. The niche in
/// `NonZeroU64` keeps `Option<OwnerId>` at eight bytes, so an
/// `AtomicCell<Option<OwnerId>>` stays lock-free on 64-bit targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct OwnerId(NonZeroU64);

static NEXT_OWNER_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static CURRENT_OWNER: OwnerId = OwnerId::next();
}

impl OwnerId {
    fn next() -> Self {
        OwnerId(NonZeroU64::MIN.saturating_add(NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed)))
    }

    /// Identity of the calling thread
    pub fn current() -> Self {
        CURRENT_OWNER.with(|id| *id)
    }

    /// Get the numeric ID value
    pub fn as_u64(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread#{}", self.0)
    }
}
