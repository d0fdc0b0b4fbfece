//! Widget schema and per-type defaults

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of whitelist fields preselected by the creation wizard
pub const DEFAULT_FIELD_COUNT: usize = 4;

/// Widget display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetType {
    Card,
    Table,
    Chart,
}

impl WidgetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetType::Card => "card",
            WidgetType::Table => "table",
            WidgetType::Chart => "chart",
        }
    }
}

/// Position and size on the integer grid, plus optional resize bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetLayout {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_h: Option<u32>,
}

/// A dashboard tile bound to a stock symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub id: String,
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    pub title: String,
    pub symbol: String,
    pub api_url: String,
    /// Refresh cadence in seconds; 0 disables automatic refresh
    pub refresh_interval: u64,
    pub selected_fields: Vec<String>,
    pub layout: WidgetLayout,
    /// Creation time, epoch milliseconds
    pub created_at: i64,
    /// Last explicit mutation via update, epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
}

impl Widget {
    /// Title to display, falling back to a computed default when empty
    pub fn display_title(&self) -> String {
        if self.title.is_empty() {
            default_title(self.widget_type, &self.symbol)
        } else {
            self.title.clone()
        }
    }
}

/// Identity-free widget creation payload. The store mints `id` and
/// `created_at`; an omitted layout triggers automatic placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSpec {
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    #[serde(default)]
    pub title: String,
    pub symbol: String,
    pub api_url: String,
    pub refresh_interval: u64,
    pub selected_fields: Vec<String>,
    #[serde(default)]
    pub layout: Option<WidgetLayout>,
}

/// Generate a unique widget id: millisecond timestamp plus random suffix
pub fn generate_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect();
    format!("widget-{}-{}", Utc::now().timestamp_millis(), suffix)
}

/// Allowed data fields for a widget type
pub fn allowed_fields(widget_type: WidgetType) -> &'static [&'static str] {
    match widget_type {
        WidgetType::Card => &["symbol", "name", "price", "change", "changePercent", "volume"],
        WidgetType::Table => &[
            "symbol",
            "name",
            "price",
            "change",
            "changePercent",
            "open",
            "high",
            "low",
            "volume",
            "marketCap",
        ],
        WidgetType::Chart => &["price", "volume"],
    }
}

/// Initial field selection offered by the creation wizard
pub fn default_fields(widget_type: WidgetType) -> Vec<String> {
    allowed_fields(widget_type)
        .iter()
        .take(DEFAULT_FIELD_COUNT)
        .map(|f| f.to_string())
        .collect()
}

/// Default size and resize bounds for a widget type, placed at the origin
pub fn default_layout(widget_type: WidgetType) -> WidgetLayout {
    let (w, h, min_w, min_h) = match widget_type {
        WidgetType::Card => (3, 2, 2, 2),
        WidgetType::Table | WidgetType::Chart => (6, 4, 4, 3),
    };
    WidgetLayout {
        x: 0,
        y: 0,
        w,
        h,
        min_w: Some(min_w),
        min_h: Some(min_h),
        max_w: None,
        max_h: None,
    }
}

/// Data-source key for a symbol. Never fetched over the network; the key
/// identifies the source to whatever provider serves the widget.
pub fn derive_api_url(symbol: &str) -> String {
    format!("/api/stock/{}", symbol)
}

/// Computed title used when a widget's own title is empty
pub fn default_title(widget_type: WidgetType, symbol: &str) -> String {
    let suffix = match widget_type {
        WidgetType::Card => "Price",
        WidgetType::Table => "Watchlist",
        WidgetType::Chart => "Chart",
    };
    format!("{} {}", symbol, suffix)
}

/// Symbols offered by the creation wizard
pub const POPULAR_SYMBOLS: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc."),
    ("GOOGL", "Alphabet Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("AMZN", "Amazon.com Inc."),
    ("TSLA", "Tesla Inc."),
    ("META", "Meta Platforms Inc."),
    ("NVDA", "NVIDIA Corporation"),
    ("JPM", "JPMorgan Chase & Co."),
    ("V", "Visa Inc."),
    ("WMT", "Walmart Inc."),
    ("NFLX", "Netflix Inc."),
    ("DIS", "Walt Disney Co."),
];
