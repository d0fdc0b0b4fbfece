//! SQLite-backed snapshot slot

use crate::db::{SnapshotStore, StoredDashboard, SNAPSHOT_KEY};
use crate::error::Result;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

/// Version of the snapshot payload schema written by this build
const SCHEMA_VERSION: i64 = 1;

/// SQLite database holding the dashboard snapshot slot
pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotStore {
    /// Open (or create) the database at `path` and run migrations
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;

        Ok(store)
    }

    /// In-memory database for tests
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS migrations (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        run_migration(&conn, "001_dashboard_snapshots", CREATE_SNAPSHOTS_TABLE)?;

        Ok(())
    }
}

fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM migrations WHERE name = ?)",
        [name],
        |row| row.get(0),
    )?;

    if !exists {
        tracing::info!("Running migration: {}", name);
        conn.execute_batch(sql)?;
        conn.execute("INSERT INTO migrations (name) VALUES (?)", [name])?;
    }

    Ok(())
}

const CREATE_SNAPSHOTS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS dashboard_snapshots (
        key TEXT PRIMARY KEY,
        schema_version INTEGER NOT NULL,
        payload TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
";

impl SnapshotStore for SqliteSnapshotStore {
    fn load(&self) -> Result<Option<StoredDashboard>> {
        let conn = self.conn.lock();

        let row: Option<(i64, String)> = conn
            .query_row(
                "SELECT schema_version, payload FROM dashboard_snapshots WHERE key = ?",
                [SNAPSHOT_KEY],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((version, payload)) = row else {
            return Ok(None);
        };

        if version > SCHEMA_VERSION {
            tracing::warn!(
                version,
                "snapshot written by a newer schema, starting empty"
            );
            return Ok(None);
        }

        let snapshot = serde_json::from_str(&payload)?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &StoredDashboard) -> Result<()> {
        let payload = serde_json::to_string(snapshot)?;
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO dashboard_snapshots (key, schema_version, payload, updated_at)
             VALUES (?, ?, ?, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET
                 schema_version = excluded.schema_version,
                 payload = excluded.payload,
                 updated_at = excluded.updated_at",
            rusqlite::params![SNAPSHOT_KEY, SCHEMA_VERSION, payload],
        )?;

        Ok(())
    }
}
