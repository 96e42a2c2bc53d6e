//! Durable entity storage.
//!
//! Each entity type persists as a single JSON snapshot file holding its whole
//! key-to-record map. [`SnapshotStore`] wraps that file behind one lock per
//! store so concurrent request tasks observe a linearizable history, and
//! [`IdAllocator`] hands out monotonic ids seeded from the persisted maximum.

mod ids;
mod snapshot;

pub use ids::IdAllocator;
pub use snapshot::SnapshotStore;
