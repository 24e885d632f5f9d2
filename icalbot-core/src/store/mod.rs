//! Persisted event snapshots.
//!
//! All reads and writes of a poll cycle go through one [`SnapshotBatch`],
//! which is committed or aborted as a whole. A cycle whose batch fails to
//! commit leaves every snapshot as it was, so nothing it computed is lost or
//! double-counted on the next tick.

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::error::BotResult;
use crate::event::EventSnapshot;

/// A store holding one [`EventSnapshot`] per event UID.
pub trait SnapshotStore {
    /// Start an atomic batch of reads and writes.
    fn begin(&self) -> BotResult<Box<dyn SnapshotBatch + '_>>;
}

/// An open read-write batch. Dropping it without committing discards writes.
pub trait SnapshotBatch {
    fn get(&self, uid: &str) -> BotResult<Option<EventSnapshot>>;

    fn put(&mut self, uid: &str, snapshot: &EventSnapshot) -> BotResult<()>;

    fn commit(self: Box<Self>) -> BotResult<()>;

    fn abort(self: Box<Self>) -> BotResult<()>;
}
