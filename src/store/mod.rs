//! Dashboard store
//!
//! The single source of truth for the widget collection and the dark-mode
//! flag. Every mutation runs as one atomic step under the state lock and
//! flushes a snapshot through the injected persistence port; persistence
//! failures are logged and never fail the mutation.

pub mod config;
pub mod layout;

pub use config::{export_file_name, read_import_file, write_export_file, DashboardConfig};
pub use layout::{merge_positions, next_position, GridPosition};

use crate::db::{SnapshotStore, StoredDashboard};
use crate::error::Result;
use crate::model::{
    default_layout, generate_id, validate_spec, validate_widget, Widget, WidgetLayout, WidgetSpec,
    WidgetType,
};
use chrono::Utc;
use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::Arc;

/// Partial widget update. Present fields are merged into the widget;
/// `layout` replaces the widget's layout wholesale (use
/// [`DashboardStore::update_widget_layout`] for a partial layout merge).
/// Identity (`id`, `created_at`) is never updatable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetUpdate {
    #[serde(rename = "type")]
    pub widget_type: Option<WidgetType>,
    pub title: Option<String>,
    pub symbol: Option<String>,
    pub api_url: Option<String>,
    pub refresh_interval: Option<u64>,
    pub selected_fields: Option<Vec<String>>,
    pub layout: Option<WidgetLayout>,
}

/// Partial layout update; omitted fields keep their current values
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPatch {
    pub x: Option<u32>,
    pub y: Option<u32>,
    pub w: Option<u32>,
    pub h: Option<u32>,
    pub min_w: Option<u32>,
    pub min_h: Option<u32>,
    pub max_w: Option<u32>,
    pub max_h: Option<u32>,
}

struct Inner {
    widgets: Vec<Widget>,
    is_dark_mode: bool,
}

/// Authoritative dashboard state container
pub struct DashboardStore {
    inner: RwLock<Inner>,
    snapshots: Arc<dyn SnapshotStore>,
}

impl DashboardStore {
    /// Create the store, rehydrating from the snapshot slot when present.
    /// A missing or unreadable snapshot yields an empty dashboard with dark
    /// mode enabled.
    pub fn new(snapshots: Arc<dyn SnapshotStore>) -> Self {
        let inner = match snapshots.load() {
            Ok(Some(snapshot)) => {
                tracing::info!(widgets = snapshot.widgets.len(), "Dashboard rehydrated");
                Inner {
                    widgets: snapshot.widgets,
                    is_dark_mode: snapshot.is_dark_mode,
                }
            }
            Ok(None) => Inner {
                widgets: Vec::new(),
                is_dark_mode: true,
            },
            Err(e) => {
                tracing::warn!("Failed to load dashboard snapshot, starting empty: {}", e);
                Inner {
                    widgets: Vec::new(),
                    is_dark_mode: true,
                }
            }
        };

        Self {
            inner: RwLock::new(inner),
            snapshots,
        }
    }

    // ========== Read Access ==========

    /// Snapshot of the current widget collection, in display order
    pub fn widgets(&self) -> Vec<Widget> {
        self.inner.read().widgets.clone()
    }

    /// Widget by id
    pub fn widget(&self, id: &str) -> Option<Widget> {
        self.inner.read().widgets.iter().find(|w| w.id == id).cloned()
    }

    pub fn widget_count(&self) -> usize {
        self.inner.read().widgets.len()
    }

    pub fn is_dark_mode(&self) -> bool {
        self.inner.read().is_dark_mode
    }

    // ========== Widget CRUD ==========

    /// Validate the spec, mint identity, and append the widget. When the
    /// spec carries no layout, the widget takes the type's default size at
    /// the next free position below all existing widgets.
    pub fn add_widget(&self, spec: WidgetSpec) -> Result<Widget> {
        validate_spec(&spec)?;

        let mut inner = self.inner.write();

        let layout = spec.layout.unwrap_or_else(|| {
            let (x, y) = layout::next_position(&inner.widgets);
            let mut layout = default_layout(spec.widget_type);
            layout.x = x;
            layout.y = y;
            layout
        });

        let widget = Widget {
            id: generate_id(),
            widget_type: spec.widget_type,
            title: spec.title,
            symbol: spec.symbol,
            api_url: spec.api_url,
            refresh_interval: spec.refresh_interval,
            selected_fields: spec.selected_fields,
            layout,
            created_at: Utc::now().timestamp_millis(),
            last_updated: None,
        };

        tracing::info!(id = %widget.id, symbol = %widget.symbol, "Widget added");
        inner.widgets.push(widget.clone());
        self.persist(&inner);

        Ok(widget)
    }

    /// Remove the widget with the given id. Removing an absent id is a
    /// no-op, not an error.
    pub fn remove_widget(&self, id: &str) {
        let mut inner = self.inner.write();
        let before = inner.widgets.len();
        inner.widgets.retain(|w| w.id != id);

        if inner.widgets.len() < before {
            tracing::info!(id, "Widget removed");
        }
        self.persist(&inner);
    }

    /// Merge a partial update into the widget with the given id and stamp
    /// `last_updated`. The merged widget is validated; an invalid result
    /// rejects the whole update and leaves the widget untouched. An absent
    /// id is a silent no-op.
    pub fn update_widget(&self, id: &str, updates: WidgetUpdate) -> Result<()> {
        let mut inner = self.inner.write();

        let Some(index) = inner.widgets.iter().position(|w| w.id == id) else {
            tracing::debug!(id, "Update for unknown widget ignored");
            return Ok(());
        };

        let mut merged = inner.widgets[index].clone();
        if let Some(widget_type) = updates.widget_type {
            merged.widget_type = widget_type;
        }
        if let Some(title) = updates.title {
            merged.title = title;
        }
        if let Some(symbol) = updates.symbol {
            merged.symbol = symbol;
        }
        if let Some(api_url) = updates.api_url {
            merged.api_url = api_url;
        }
        if let Some(refresh_interval) = updates.refresh_interval {
            merged.refresh_interval = refresh_interval;
        }
        if let Some(selected_fields) = updates.selected_fields {
            merged.selected_fields = selected_fields;
        }
        if let Some(layout) = updates.layout {
            merged.layout = layout;
        }
        merged.last_updated = Some(Utc::now().timestamp_millis());

        validate_widget(&merged)?;

        inner.widgets[index] = merged;
        self.persist(&inner);
        Ok(())
    }

    /// Merge a partial layout patch into the widget's layout, leaving all
    /// omitted layout fields as they are. Does not stamp `last_updated`.
    pub fn update_widget_layout(&self, id: &str, patch: LayoutPatch) -> Result<()> {
        let mut inner = self.inner.write();

        let Some(index) = inner.widgets.iter().position(|w| w.id == id) else {
            return Ok(());
        };

        let mut layout = inner.widgets[index].layout.clone();
        if let Some(x) = patch.x {
            layout.x = x;
        }
        if let Some(y) = patch.y {
            layout.y = y;
        }
        if let Some(w) = patch.w {
            layout.w = w;
        }
        if let Some(h) = patch.h {
            layout.h = h;
        }
        if let Some(min_w) = patch.min_w {
            layout.min_w = Some(min_w);
        }
        if let Some(min_h) = patch.min_h {
            layout.min_h = Some(min_h);
        }
        if let Some(max_w) = patch.max_w {
            layout.max_w = Some(max_w);
        }
        if let Some(max_h) = patch.max_h {
            layout.max_h = Some(max_h);
        }

        crate::model::validate::validate_layout(&layout)?;

        inner.widgets[index].layout = layout;
        self.persist(&inner);
        Ok(())
    }

    /// Bulk reconciliation of grid-reported positions, keyed by id.
    /// Strictly a positional overwrite: never reorders, adds, or drops.
    pub fn update_all_layouts(&self, reported: &[GridPosition]) {
        let mut inner = self.inner.write();
        layout::merge_positions(&mut inner.widgets, reported);
        self.persist(&inner);
    }

    // ========== Dashboard Operations ==========

    /// Remove every widget
    pub fn clear_dashboard(&self) {
        let mut inner = self.inner.write();
        inner.widgets.clear();
        tracing::info!("Dashboard cleared");
        self.persist(&inner);
    }

    /// Snapshot the current widgets into an export envelope. Pure; does not
    /// mutate or persist.
    pub fn export_dashboard(&self) -> DashboardConfig {
        DashboardConfig {
            widgets: self.inner.read().widgets.clone(),
            version: config::CONFIG_VERSION.to_string(),
            exported_at: Utc::now().timestamp_millis(),
        }
    }

    /// Replace the whole collection with the imported widgets, re-minting
    /// every id and `created_at` so imported files can never collide with
    /// ids from a previous session. All-or-nothing: if any imported widget
    /// is invalid the live collection is left completely unchanged and
    /// `false` is returned.
    pub fn import_dashboard(&self, config: DashboardConfig) -> bool {
        for widget in &config.widgets {
            if let Err(e) = validate_widget(widget) {
                tracing::warn!("Import rejected: {}", e);
                return false;
            }
        }

        let now = Utc::now().timestamp_millis();
        let imported: Vec<Widget> = config
            .widgets
            .into_iter()
            .map(|w| Widget {
                id: generate_id(),
                created_at: now,
                ..w
            })
            .collect();

        let mut inner = self.inner.write();
        tracing::info!(widgets = imported.len(), "Dashboard imported");
        inner.widgets = imported;
        self.persist(&inner);
        true
    }

    // ========== Theme ==========

    /// Flip the dark-mode flag and return the new value
    pub fn toggle_dark_mode(&self) -> bool {
        let mut inner = self.inner.write();
        inner.is_dark_mode = !inner.is_dark_mode;
        let mode = inner.is_dark_mode;
        self.persist(&inner);
        mode
    }

    /// Flush the current state through the persistence port. Failures are
    /// logged and swallowed; durability is best-effort per mutation.
    fn persist(&self, inner: &Inner) {
        let snapshot = StoredDashboard {
            widgets: inner.widgets.clone(),
            is_dark_mode: inner.is_dark_mode,
        };
        if let Err(e) = self.snapshots.save(&snapshot) {
            tracing::warn!("Failed to persist dashboard snapshot: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemorySnapshotStore;
    use crate::model::{default_fields, derive_api_url};

    fn test_store() -> DashboardStore {
        DashboardStore::new(Arc::new(MemorySnapshotStore::new()))
    }

    fn card_spec(symbol: &str) -> WidgetSpec {
        WidgetSpec {
            widget_type: WidgetType::Card,
            title: String::new(),
            symbol: symbol.to_string(),
            api_url: derive_api_url(symbol),
            refresh_interval: 30,
            selected_fields: default_fields(WidgetType::Card),
            layout: None,
        }
    }

    fn table_spec(symbol: &str) -> WidgetSpec {
        WidgetSpec {
            widget_type: WidgetType::Table,
            title: String::new(),
            symbol: symbol.to_string(),
            api_url: derive_api_url(symbol),
            refresh_interval: 60,
            selected_fields: default_fields(WidgetType::Table),
            layout: None,
        }
    }

    #[test]
    fn test_added_widget_ids_are_pairwise_distinct() {
        let store = test_store();
        for _ in 0..20 {
            store.add_widget(card_spec("AAPL")).unwrap();
        }

        let mut ids: Vec<String> = store.widgets().iter().map(|w| w.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_add_widget_rejects_invalid_fields() {
        let store = test_store();
        let mut spec = card_spec("AAPL");
        spec.selected_fields.push("marketCap".to_string());

        assert!(store.add_widget(spec).is_err());
        assert_eq!(store.widget_count(), 0);
    }

    #[test]
    fn test_placement_appends_below_lowest_row() {
        let store = test_store();
        store.add_widget(card_spec("AAPL")).unwrap(); // card 3x2 at y=0
        store.add_widget(table_spec("MSFT")).unwrap(); // table 6x4 at y=2

        let third = store.add_widget(card_spec("TSLA")).unwrap();
        assert_eq!(third.layout.x, 0);
        assert_eq!(third.layout.y, 6);
    }

    #[test]
    fn test_explicit_layout_is_honoured() {
        let store = test_store();
        let mut spec = card_spec("AAPL");
        spec.layout = Some(WidgetLayout {
            x: 4,
            y: 7,
            w: 3,
            h: 2,
            min_w: Some(2),
            min_h: Some(2),
            max_w: None,
            max_h: None,
        });

        let widget = store.add_widget(spec).unwrap();
        assert_eq!((widget.layout.x, widget.layout.y), (4, 7));
    }

    #[test]
    fn test_remove_widget_is_idempotent() {
        let store = test_store();
        let widget = store.add_widget(card_spec("AAPL")).unwrap();

        store.remove_widget(&widget.id);
        assert_eq!(store.widget_count(), 0);
        // Second removal of the same id is a no-op
        store.remove_widget(&widget.id);
        assert_eq!(store.widget_count(), 0);
    }

    #[test]
    fn test_update_widget_merges_and_stamps() {
        let store = test_store();
        let widget = store.add_widget(card_spec("AAPL")).unwrap();
        assert!(widget.last_updated.is_none());

        store
            .update_widget(
                &widget.id,
                WidgetUpdate {
                    title: Some("My Card".to_string()),
                    refresh_interval: Some(120),
                    ..Default::default()
                },
            )
            .unwrap();

        let updated = store.widget(&widget.id).unwrap();
        assert_eq!(updated.title, "My Card");
        assert_eq!(updated.refresh_interval, 120);
        // Untouched fields survive the merge
        assert_eq!(updated.symbol, "AAPL");
        assert!(updated.last_updated.is_some());
    }

    #[test]
    fn test_update_unknown_widget_is_noop() {
        let store = test_store();
        store.add_widget(card_spec("AAPL")).unwrap();

        store
            .update_widget(
                "widget-missing",
                WidgetUpdate {
                    title: Some("x".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(store.widgets()[0].title, "");
    }

    #[test]
    fn test_update_widget_rejects_invalid_merge() {
        let store = test_store();
        let widget = store.add_widget(card_spec("AAPL")).unwrap();

        let result = store.update_widget(
            &widget.id,
            WidgetUpdate {
                selected_fields: Some(vec!["open".to_string()]), // not a card field
                ..Default::default()
            },
        );

        assert!(result.is_err());
        let unchanged = store.widget(&widget.id).unwrap();
        assert_eq!(unchanged.selected_fields, default_fields(WidgetType::Card));
        assert!(unchanged.last_updated.is_none());
    }

    #[test]
    fn test_layout_patch_keeps_omitted_fields() {
        let store = test_store();
        let widget = store.add_widget(card_spec("AAPL")).unwrap();

        store
            .update_widget_layout(
                &widget.id,
                LayoutPatch {
                    x: Some(5),
                    ..Default::default()
                },
            )
            .unwrap();

        let layout = store.widget(&widget.id).unwrap().layout;
        assert_eq!(layout.x, 5);
        // Omitted fields must not reset to defaults
        assert_eq!(layout.w, 3);
        assert_eq!(layout.min_w, Some(2));
        // Layout-only updates do not stamp last_updated
        assert!(store.widget(&widget.id).unwrap().last_updated.is_none());
    }

    #[test]
    fn test_update_all_layouts_is_idempotent() {
        let store = test_store();
        let a = store.add_widget(card_spec("AAPL")).unwrap();
        let b = store.add_widget(table_spec("MSFT")).unwrap();

        let reported = vec![
            GridPosition {
                id: a.id.clone(),
                x: 6,
                y: 0,
                w: 3,
                h: 2,
            },
            GridPosition {
                id: b.id.clone(),
                x: 0,
                y: 0,
                w: 6,
                h: 4,
            },
        ];

        store.update_all_layouts(&reported);
        let once = store.widgets();
        store.update_all_layouts(&reported);
        assert_eq!(store.widgets(), once);
    }

    #[test]
    fn test_update_all_layouts_preserves_ids_and_count() {
        let store = test_store();
        let a = store.add_widget(card_spec("AAPL")).unwrap();
        store.add_widget(table_spec("MSFT")).unwrap();

        store.update_all_layouts(&[GridPosition {
            id: a.id.clone(),
            x: 1,
            y: 1,
            w: 3,
            h: 2,
        }]);

        let widgets = store.widgets();
        assert_eq!(widgets.len(), 2);
        assert_eq!(widgets[0].id, a.id);
        assert_eq!((widgets[0].layout.x, widgets[0].layout.y), (1, 1));
    }

    #[test]
    fn test_export_then_import_re_mints_ids() {
        let store = test_store();
        store.add_widget(card_spec("AAPL")).unwrap();
        store.add_widget(table_spec("MSFT")).unwrap();

        let before = store.widgets();
        let exported = store.export_dashboard();
        assert!(store.import_dashboard(exported));

        let after = store.widgets();
        assert_eq!(after.len(), before.len());
        for (old, new) in before.iter().zip(after.iter()) {
            assert_ne!(old.id, new.id);
            assert_eq!(old.widget_type, new.widget_type);
            assert_eq!(old.title, new.title);
            assert_eq!(old.symbol, new.symbol);
            assert_eq!(old.refresh_interval, new.refresh_interval);
            assert_eq!(old.selected_fields, new.selected_fields);
            assert_eq!(old.layout, new.layout);
        }
    }

    #[test]
    fn test_import_invalid_widget_leaves_state_unchanged() {
        let store = test_store();
        store.add_widget(card_spec("AAPL")).unwrap();
        let before = store.widgets();

        let mut exported = store.export_dashboard();
        exported.widgets[0].selected_fields = vec!["bogus".to_string()];

        assert!(!store.import_dashboard(exported));
        assert_eq!(store.widgets(), before);
    }

    #[test]
    fn test_import_schema_rejection_leaves_state_unchanged() {
        let store = test_store();
        store.add_widget(card_spec("AAPL")).unwrap();
        let before = store.widgets();

        let raw = serde_json::json!({ "widgets": "not-an-array" });
        assert!(DashboardConfig::from_value(raw).is_err());
        // Schema rejection happens before the store is touched
        assert_eq!(store.widgets(), before);
    }

    #[test]
    fn test_clear_then_export_is_empty_envelope() {
        let store = test_store();
        store.add_widget(card_spec("AAPL")).unwrap();
        store.clear_dashboard();

        let exported = store.export_dashboard();
        assert!(exported.widgets.is_empty());
        assert_eq!(exported.version, config::CONFIG_VERSION);
        assert!(exported.exported_at > 0);
    }

    #[test]
    fn test_toggle_dark_mode_twice_restores_flag() {
        let store = test_store();
        let initial = store.is_dark_mode();

        store.toggle_dark_mode();
        assert_eq!(store.is_dark_mode(), !initial);
        store.toggle_dark_mode();
        assert_eq!(store.is_dark_mode(), initial);
    }

    #[test]
    fn test_mutations_persist_through_port() {
        let snapshots = Arc::new(MemorySnapshotStore::new());
        let store = DashboardStore::new(snapshots.clone());

        store.add_widget(card_spec("AAPL")).unwrap();
        assert_eq!(snapshots.widget_count(), 1);

        store.clear_dashboard();
        assert_eq!(snapshots.widget_count(), 0);
    }

    #[test]
    fn test_rehydrates_from_snapshot() {
        let snapshots = Arc::new(MemorySnapshotStore::new());
        {
            let store = DashboardStore::new(snapshots.clone());
            store.add_widget(card_spec("AAPL")).unwrap();
            store.toggle_dark_mode(); // dark mode off
        }

        let store = DashboardStore::new(snapshots);
        assert_eq!(store.widget_count(), 1);
        assert_eq!(store.widgets()[0].symbol, "AAPL");
        assert!(!store.is_dark_mode());
    }
}
