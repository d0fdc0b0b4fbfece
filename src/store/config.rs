//! Dashboard export/import envelope and file handling

use crate::error::{ImportError, Result};
use crate::model::Widget;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Version string stamped into every export
pub const CONFIG_VERSION: &str = "1.0.0";

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

/// Backup/restore wire format. Carries the widget collection only; the
/// dark-mode flag stays local and is excluded from export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    pub widgets: Vec<Widget>,
    #[serde(default = "default_version")]
    pub version: String,
    /// Export time, epoch milliseconds
    #[serde(default)]
    pub exported_at: i64,
}

impl DashboardConfig {
    /// Validate a raw JSON document against the envelope schema.
    ///
    /// The `widgets` key must be present and array-typed before the typed
    /// deserialization runs, so a shape mismatch surfaces as a schema error
    /// rather than a serde parse error.
    pub fn from_value(value: serde_json::Value) -> std::result::Result<Self, ImportError> {
        match value.get("widgets") {
            None => {
                return Err(ImportError::Schema(
                    "missing 'widgets' collection".to_string(),
                ))
            }
            Some(widgets) if !widgets.is_array() => {
                return Err(ImportError::Schema(
                    "'widgets' must be an array".to_string(),
                ))
            }
            Some(_) => {}
        }

        serde_json::from_value(value).map_err(|e| ImportError::Schema(e.to_string()))
    }

    /// Parse an uploaded dashboard file. Malformed JSON yields
    /// `ImportError::Parse`; well-formed JSON with a bad shape yields
    /// `ImportError::Schema`.
    pub fn from_json_str(raw: &str) -> std::result::Result<Self, ImportError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }
}

/// Conventional export file name: `finboard-dashboard-<date>.json`
pub fn export_file_name() -> String {
    format!("finboard-dashboard-{}.json", Utc::now().format("%Y-%m-%d"))
}

/// Write a pretty-printed export into `dir` using the conventional file
/// name. Returns the path written.
pub fn write_export_file(config: &DashboardConfig, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(export_file_name());
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    tracing::info!(path = %path.display(), widgets = config.widgets.len(), "Dashboard exported");
    Ok(path)
}

/// Read and validate an uploaded dashboard file
pub fn read_import_file(path: &Path) -> std::result::Result<DashboardConfig, ImportError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ImportError::Schema(format!("unreadable file: {}", e)))?;
    DashboardConfig::from_json_str(&raw)
}
