//! Application state management

use crate::db::{SnapshotStore, SqliteSnapshotStore};
use crate::error::{ImportError, Result};
use crate::market::{MockQuoteProvider, QuoteProvider};
use crate::model::{Widget, WidgetSpec};
use crate::scheduler::{RefreshScheduler, StockDataHandle};
use crate::store::{
    read_import_file, write_export_file, DashboardConfig, DashboardStore, GridPosition,
    LayoutPatch, WidgetUpdate,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Event published to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    /// Dark-mode flag changed, or was restored on startup
    ThemeChanged(bool),
}

/// Application state shared across the UI boundary.
///
/// Owns the dashboard store and the refresh scheduler and keeps the two
/// consistent: every widget in the collection has exactly one refresh task,
/// and removed widgets have none. Instantiated once at startup, inside the
/// async runtime, and kept alive for the process lifetime.
pub struct AppState {
    /// Authoritative widget collection and theme flag
    pub store: Arc<DashboardStore>,

    /// Per-widget refresh tasks
    pub scheduler: Arc<RefreshScheduler>,

    events: broadcast::Sender<DashboardEvent>,
}

impl AppState {
    /// Production wiring: SQLite snapshot slot under `data_dir`, mock
    /// market data provider.
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        tracing::info!("Data directory: {:?}", data_dir);

        let snapshots = Arc::new(SqliteSnapshotStore::new(&data_dir.join("finboard.db"))?);
        Ok(Self::with_parts(snapshots, Arc::new(MockQuoteProvider::new())))
    }

    /// Explicit wiring; lets tests inject snapshot-store and provider
    /// doubles. Rehydrates the store, starts refresh tasks for every
    /// restored widget, and announces the restored theme.
    pub fn with_parts(
        snapshots: Arc<dyn SnapshotStore>,
        provider: Arc<dyn QuoteProvider>,
    ) -> Self {
        let store = Arc::new(DashboardStore::new(snapshots));
        let scheduler = Arc::new(RefreshScheduler::new(provider));
        let (events, _) = broadcast::channel(16);

        let state = Self {
            store,
            scheduler,
            events,
        };
        state.scheduler.sync_all(&state.store.widgets());
        state.emit(DashboardEvent::ThemeChanged(state.store.is_dark_mode()));
        state
    }

    /// Subscribe to presentation-layer events
    pub fn subscribe_events(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: DashboardEvent) {
        // No receivers is fine; events are advisory
        let _ = self.events.send(event);
    }

    // ========== Widget Operations ==========

    /// Add a widget and start its refresh task
    pub fn add_widget(&self, spec: WidgetSpec) -> Result<Widget> {
        let widget = self.store.add_widget(spec)?;
        self.scheduler.subscribe(&widget);
        Ok(widget)
    }

    /// Remove a widget, cancelling its refresh task first so no orphaned
    /// timer can fetch for a widget that no longer exists
    pub fn remove_widget(&self, id: &str) {
        self.scheduler.cancel(id);
        self.store.remove_widget(id);
    }

    /// Update a widget; the refresh task restarts only when the symbol,
    /// cadence, or widget type actually changed
    pub fn update_widget(&self, id: &str, updates: WidgetUpdate) -> Result<()> {
        self.store.update_widget(id, updates)?;
        if let Some(widget) = self.store.widget(id) {
            self.scheduler.sync_widget(&widget);
        }
        Ok(())
    }

    pub fn update_widget_layout(&self, id: &str, patch: LayoutPatch) -> Result<()> {
        self.store.update_widget_layout(id, patch)
    }

    pub fn update_all_layouts(&self, reported: &[GridPosition]) {
        self.store.update_all_layouts(reported);
    }

    /// Fetch-state handle for a widget, if it is subscribed
    pub fn widget_data(&self, id: &str) -> Option<StockDataHandle> {
        self.scheduler.data(id)
    }

    // ========== Dashboard Operations ==========

    /// Remove every widget and cancel every refresh task
    pub fn clear_dashboard(&self) {
        self.scheduler.cancel_all();
        self.store.clear_dashboard();
    }

    pub fn export_dashboard(&self) -> DashboardConfig {
        self.store.export_dashboard()
    }

    /// Write the export file into `dir` and return the path written
    pub fn export_to_file(&self, dir: &Path) -> Result<PathBuf> {
        write_export_file(&self.store.export_dashboard(), dir)
    }

    /// Replace the dashboard with an imported config and re-sync refresh
    /// tasks to the new collection
    pub fn import_dashboard(&self, config: DashboardConfig) -> bool {
        let imported = self.store.import_dashboard(config);
        if imported {
            self.scheduler.sync_all(&self.store.widgets());
        }
        imported
    }

    /// Import from an uploaded file. Returns the number of widgets
    /// imported; parse and schema failures leave live state untouched.
    pub fn import_from_file(&self, path: &Path) -> std::result::Result<usize, ImportError> {
        let config = read_import_file(path)?;
        if !self.import_dashboard(config) {
            return Err(ImportError::Schema(
                "a widget in the file failed validation".to_string(),
            ));
        }
        Ok(self.store.widget_count())
    }

    // ========== Theme ==========

    /// Flip dark mode and notify the presentation layer
    pub fn toggle_dark_mode(&self) -> bool {
        let mode = self.store.toggle_dark_mode();
        self.emit(DashboardEvent::ThemeChanged(mode));
        mode
    }

    pub fn is_dark_mode(&self) -> bool {
        self.store.is_dark_mode()
    }
}
