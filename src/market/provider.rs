//! Market data provider trait and quote types

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Snapshot quote for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week52_high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week52_low: Option<f64>,
}

/// One point of an intraday price series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Clock label, e.g. "14:35"
    pub time: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<i64>,
}

/// Data source all widgets fetch through. Implementations must be safe to
/// call concurrently from per-widget refresh tasks.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Provider id for logs
    fn id(&self) -> &'static str;

    /// Current quote for a symbol
    async fn fetch_quote(&self, symbol: &str) -> Result<StockQuote>;

    /// Intraday series for a symbol, most recent point last
    async fn fetch_chart(&self, symbol: &str, points: usize) -> Result<Vec<ChartPoint>>;

    /// Quotes for the first `count` popular symbols (table widgets)
    async fn fetch_table(&self, count: usize) -> Result<Vec<StockQuote>>;
}
