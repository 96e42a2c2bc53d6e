//! Monotonic id allocation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out strictly increasing numeric ids for one entity type.
///
/// The counter lives in memory only. At startup it is seeded from the ids
/// already present in the entity's snapshot, so after a restart allocation
/// continues above the persisted maximum instead of reusing ids.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    /// Creates an allocator starting at 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Creates an allocator continuing after the largest existing id,
    /// or starting at 1 when there are none.
    pub fn seeded(existing: impl IntoIterator<Item = u64>) -> Self {
        let max = existing.into_iter().max().unwrap_or(0);
        Self {
            next: AtomicU64::new(max + 1),
        }
    }

    /// Returns the next id. Concurrent callers never observe the same value.
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
