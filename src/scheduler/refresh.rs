//! Per-widget refresh tasks

use crate::market::mock::DEFAULT_CHART_POINTS;
use crate::market::provider::{ChartPoint, QuoteProvider, StockQuote};
use crate::model::{Widget, WidgetType};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Rows served to table widgets
pub const DEFAULT_TABLE_ROWS: usize = 10;

/// Payload of a completed fetch, shaped by the widget type
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetData {
    Quote(StockQuote),
    Chart(Vec<ChartPoint>),
    Table(Vec<StockQuote>),
}

/// Observable fetch state for one widget. A failed attempt sets `error`
/// and keeps the last successful `data`; `last_fetched` moves only on
/// success.
#[derive(Debug, Clone, Default)]
pub struct FetchState {
    pub data: Option<WidgetData>,
    pub loading: bool,
    pub error: Option<String>,
    /// Epoch milliseconds of the last successful fetch
    pub last_fetched: Option<i64>,
}

/// Handle through which the presentation layer observes one widget's data
/// and requests out-of-band refreshes.
#[derive(Clone)]
pub struct StockDataHandle {
    state: Arc<RwLock<FetchState>>,
    refetch_tx: mpsc::Sender<()>,
}

impl StockDataHandle {
    /// Copy of the current fetch state
    pub fn snapshot(&self) -> FetchState {
        self.state.read().clone()
    }

    /// Request a fetch now, without resetting the schedule's phase. A
    /// request while one is already queued is coalesced.
    pub fn refetch(&self) {
        let _ = self.refetch_tx.try_send(());
    }
}

struct RefreshTask {
    handle: JoinHandle<()>,
    data: StockDataHandle,
    // Parameters the running task captured; a change requires re-subscribe
    widget_type: WidgetType,
    symbol: String,
    refresh_interval: u64,
}

impl RefreshTask {
    fn matches(&self, widget: &Widget) -> bool {
        self.widget_type == widget.widget_type
            && self.symbol == widget.symbol
            && self.refresh_interval == widget.refresh_interval
    }
}

/// Owns every widget's refresh task, keyed by widget id
pub struct RefreshScheduler {
    provider: Arc<dyn QuoteProvider>,
    tasks: DashMap<String, RefreshTask>,
}

impl RefreshScheduler {
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self {
            provider,
            tasks: DashMap::new(),
        }
    }

    /// Start (or restart) the refresh task for a widget. Fetches once
    /// immediately, then on the widget's cadence when it is non-zero. An
    /// existing task for the same id is cancelled first, so a symbol or
    /// interval change never leaves a stale timer running.
    pub fn subscribe(&self, widget: &Widget) -> StockDataHandle {
        self.cancel(&widget.id);

        let state = Arc::new(RwLock::new(FetchState {
            loading: true,
            ..FetchState::default()
        }));
        let (refetch_tx, refetch_rx) = mpsc::channel(1);

        let handle = tokio::spawn(run_refresh_loop(
            self.provider.clone(),
            widget.widget_type,
            widget.symbol.clone(),
            widget.refresh_interval,
            state.clone(),
            refetch_rx,
        ));

        let data = StockDataHandle { state, refetch_tx };
        tracing::debug!(id = %widget.id, symbol = %widget.symbol, interval = widget.refresh_interval, "Refresh task started");

        self.tasks.insert(
            widget.id.clone(),
            RefreshTask {
                handle,
                data: data.clone(),
                widget_type: widget.widget_type,
                symbol: widget.symbol.clone(),
                refresh_interval: widget.refresh_interval,
            },
        );

        data
    }

    /// Data handle for a subscribed widget
    pub fn data(&self, id: &str) -> Option<StockDataHandle> {
        self.tasks.get(id).map(|task| task.data.clone())
    }

    pub fn is_subscribed(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    /// Cancel the task for a widget id, if any. Safe to call for absent
    /// ids; cancellation happens exactly once per task.
    pub fn cancel(&self, id: &str) {
        if let Some((_, task)) = self.tasks.remove(id) {
            task.handle.abort();
            tracing::debug!(id, "Refresh task cancelled");
        }
    }

    /// Re-subscribe a widget only if its captured parameters changed
    pub fn sync_widget(&self, widget: &Widget) {
        let unchanged = self
            .tasks
            .get(&widget.id)
            .map(|task| task.matches(widget))
            .unwrap_or(false);

        if !unchanged {
            self.subscribe(widget);
        }
    }

    /// Bring the task set in line with a widget collection: cancel tasks
    /// whose widget is gone, subscribe the rest as needed.
    pub fn sync_all(&self, widgets: &[Widget]) {
        let stale: Vec<String> = self
            .tasks
            .iter()
            .filter(|entry| !widgets.iter().any(|w| w.id == *entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        for id in stale {
            self.cancel(&id);
        }

        for widget in widgets {
            self.sync_widget(widget);
        }
    }

    pub fn cancel_all(&self) {
        let ids: Vec<String> = self.tasks.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            self.cancel(&id);
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        for entry in self.tasks.iter() {
            entry.value().handle.abort();
        }
    }
}

async fn run_refresh_loop(
    provider: Arc<dyn QuoteProvider>,
    widget_type: WidgetType,
    symbol: String,
    interval_secs: u64,
    state: Arc<RwLock<FetchState>>,
    mut refetch_rx: mpsc::Receiver<()>,
) {
    // One fetch up front, before any interval-based fetch
    fetch_once(&provider, widget_type, &symbol, &state).await;

    if interval_secs == 0 {
        // Manual only: fetch on explicit refetch requests
        while refetch_rx.recv().await.is_some() {
            fetch_once(&provider, widget_type, &symbol, &state).await;
        }
        return;
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // interval fires immediately; the up-front fetch already covered that
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                fetch_once(&provider, widget_type, &symbol, &state).await;
            }
            // Out-of-band request; deliberately does not reset the ticker
            Some(_) = refetch_rx.recv() => {
                fetch_once(&provider, widget_type, &symbol, &state).await;
            }
        }
    }
}

async fn fetch_once(
    provider: &Arc<dyn QuoteProvider>,
    widget_type: WidgetType,
    symbol: &str,
    state: &Arc<RwLock<FetchState>>,
) {
    {
        let mut s = state.write();
        s.loading = true;
        s.error = None;
    }

    let result = match widget_type {
        WidgetType::Card => provider.fetch_quote(symbol).await.map(WidgetData::Quote),
        WidgetType::Chart => provider
            .fetch_chart(symbol, DEFAULT_CHART_POINTS)
            .await
            .map(WidgetData::Chart),
        WidgetType::Table => provider
            .fetch_table(DEFAULT_TABLE_ROWS)
            .await
            .map(WidgetData::Table),
    };

    let mut s = state.write();
    s.loading = false;
    match result {
        Ok(data) => {
            s.data = Some(data);
            s.last_fetched = Some(Utc::now().timestamp_millis());
        }
        Err(e) => {
            // Keep stale data so the widget can render while showing the error
            s.error = Some(e.to_string());
            tracing::warn!(symbol, "Fetch failed: {}", e);
        }
    }
}
