//! In-memory snapshot slot, used as a test double for the SQLite store

use crate::db::{SnapshotStore, StoredDashboard};
use crate::error::Result;
use parking_lot::Mutex;

/// Snapshot store backed by a mutex-guarded slot. Keeps the same
/// overwrite-on-save semantics as the durable backend.
#[derive(Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<StoredDashboard>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of widgets currently in the slot, for test assertions
    pub fn widget_count(&self) -> usize {
        self.slot
            .lock()
            .as_ref()
            .map(|s| s.widgets.len())
            .unwrap_or(0)
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<StoredDashboard>> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, snapshot: &StoredDashboard) -> Result<()> {
        *self.slot.lock() = Some(snapshot.clone());
        Ok(())
    }
}
