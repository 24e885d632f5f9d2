//! Snapshot store backed by a redb database file.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use tracing::warn;

use crate::error::{BotError, BotResult};
use crate::event::EventSnapshot;
use crate::store::{SnapshotBatch, SnapshotStore};

/// UID -> JSON-encoded snapshot
const EVENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("events");

pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open the database at `path`, creating it and its parent directory if
    /// needed.
    pub fn open(path: &Path) -> BotResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(path).map_err(store_error)?;

        // Make sure the table exists so read paths never see TableDoesNotExist
        let txn = db.begin_write().map_err(store_error)?;
        txn.open_table(EVENTS).map_err(store_error)?;
        txn.commit().map_err(store_error)?;

        Ok(RedbStore { db })
    }
}

impl SnapshotStore for RedbStore {
    fn begin(&self) -> BotResult<Box<dyn SnapshotBatch + '_>> {
        let txn = self.db.begin_write().map_err(store_error)?;
        Ok(Box::new(RedbBatch { txn }))
    }
}

struct RedbBatch {
    txn: WriteTransaction,
}

impl SnapshotBatch for RedbBatch {
    fn get(&self, uid: &str) -> BotResult<Option<EventSnapshot>> {
        let table = self.txn.open_table(EVENTS).map_err(store_error)?;

        let Some(bytes) = table.get(uid).map_err(store_error)? else {
            return Ok(None);
        };

        match serde_json::from_slice(bytes.value()) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                // An unreadable record is treated as never seen
                warn!("Discarding unreadable snapshot for {uid}: {e}");
                Ok(None)
            }
        }
    }

    fn put(&mut self, uid: &str, snapshot: &EventSnapshot) -> BotResult<()> {
        let bytes =
            serde_json::to_vec(snapshot).map_err(|e| BotError::Serialization(e.to_string()))?;

        let mut table = self.txn.open_table(EVENTS).map_err(store_error)?;
        table.insert(uid, bytes.as_slice()).map_err(store_error)?;

        Ok(())
    }

    fn commit(self: Box<Self>) -> BotResult<()> {
        self.txn.commit().map_err(store_error)
    }

    fn abort(self: Box<Self>) -> BotResult<()> {
        self.txn.abort().map_err(store_error)
    }
}

fn store_error(e: impl Into<redb::Error>) -> BotError {
    BotError::Store(e.into().to_string())
}
