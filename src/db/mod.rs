//! Snapshot persistence
//!
//! The dashboard persists as a single JSON document in a local durable slot.
//! `SnapshotStore` is the port the store writes through; the SQLite backend
//! is the production implementation and the in-memory backend serves tests.

mod memory;
mod sqlite;

pub use memory::MemorySnapshotStore;
pub use sqlite::SqliteSnapshotStore;

use crate::error::Result;
use crate::model::Widget;
use serde::{Deserialize, Serialize};

/// Storage key for the dashboard snapshot slot
pub const SNAPSHOT_KEY: &str = "finboard-dashboard";

/// Full serialized dashboard state at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDashboard {
    pub widgets: Vec<Widget>,
    pub is_dark_mode: bool,
}

/// Durable slot for the dashboard snapshot
pub trait SnapshotStore: Send + Sync {
    /// Read the current snapshot; `None` when the slot has never been written
    fn load(&self) -> Result<Option<StoredDashboard>>;

    /// Overwrite the slot with a new snapshot
    fn save(&self, snapshot: &StoredDashboard) -> Result<()>;
}
