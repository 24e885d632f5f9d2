//! In-memory snapshot store.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::{BotError, BotResult};
use crate::event::EventSnapshot;
use crate::store::{SnapshotBatch, SnapshotStore};

/// Keeps snapshots for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: Mutex<BTreeMap<String, EventSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Committed snapshot for `uid`, outside of any batch.
    pub fn snapshot(&self, uid: &str) -> Option<EventSnapshot> {
        self.snapshots.lock().ok()?.get(uid).cloned()
    }
}

impl SnapshotStore for MemoryStore {
    fn begin(&self) -> BotResult<Box<dyn SnapshotBatch + '_>> {
        Ok(Box::new(MemoryBatch {
            store: self,
            staged: BTreeMap::new(),
        }))
    }
}

struct MemoryBatch<'a> {
    store: &'a MemoryStore,
    staged: BTreeMap<String, EventSnapshot>,
}

impl SnapshotBatch for MemoryBatch<'_> {
    fn get(&self, uid: &str) -> BotResult<Option<EventSnapshot>> {
        if let Some(snapshot) = self.staged.get(uid) {
            return Ok(Some(snapshot.clone()));
        }

        let snapshots = self
            .store
            .snapshots
            .lock()
            .map_err(|e| BotError::Store(e.to_string()))?;
        Ok(snapshots.get(uid).cloned())
    }

    fn put(&mut self, uid: &str, snapshot: &EventSnapshot) -> BotResult<()> {
        self.staged.insert(uid.to_string(), snapshot.clone());
        Ok(())
    }

    fn commit(self: Box<Self>) -> BotResult<()> {
        let mut snapshots = self
            .store
            .snapshots
            .lock()
            .map_err(|e| BotError::Store(e.to_string()))?;
        snapshots.extend(self.staged);
        Ok(())
    }

    fn abort(self: Box<Self>) -> BotResult<()> {
        Ok(())
    }
}
