//! Refresh scheduling for FinBoard widgets
//!
//! Each widget owns an independent, cancellable refresh task keyed by
//! widget id. Tasks are started when a widget is added, replaced when its
//! symbol or cadence changes, and cancelled exactly once on removal.

mod refresh;

pub use refresh::{
    FetchState, RefreshScheduler, StockDataHandle, WidgetData, DEFAULT_TABLE_ROWS,
};
