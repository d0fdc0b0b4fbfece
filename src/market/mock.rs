//! Simulated market data source
//!
//! Serves realistic-looking quotes without any network IO: fixed base
//! prices per known symbol, random jitter around them, simulated request
//! latency, and an occasional simulated failure so error paths stay
//! exercised.

use crate::error::{AppError, Result};
use crate::market::provider::{ChartPoint, QuoteProvider, StockQuote};
use crate::model::POPULAR_SYMBOLS;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use std::time::Duration;

/// Default chart series length
pub const DEFAULT_CHART_POINTS: usize = 30;

/// Mock data source with configurable failure rate and latency
pub struct MockQuoteProvider {
    failure_rate: f64,
    simulate_latency: bool,
}

impl MockQuoteProvider {
    /// Production-flavoured mock: 300-800 ms latency, 5% failure rate
    pub fn new() -> Self {
        Self {
            failure_rate: 0.05,
            simulate_latency: true,
        }
    }

    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = failure_rate;
        self
    }

    /// Skip the simulated latency; used by tests
    pub fn without_latency(mut self) -> Self {
        self.simulate_latency = false;
        self
    }

    async fn simulate_request(&self) -> Result<()> {
        // ThreadRng is not Send, so sample before awaiting
        let (delay_ms, failed) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_range(300..800),
                rng.gen::<f64>() < self.failure_rate,
            )
        };

        if self.simulate_latency {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        if failed {
            return Err(AppError::Fetch(
                "API rate limit exceeded. Please try again later.".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MockQuoteProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteProvider for MockQuoteProvider {
    fn id(&self) -> &'static str {
        "mock"
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<StockQuote> {
        self.simulate_request().await?;
        Ok(generate_quote(symbol))
    }

    async fn fetch_chart(&self, symbol: &str, points: usize) -> Result<Vec<ChartPoint>> {
        self.simulate_request().await?;
        Ok(generate_chart(symbol, points))
    }

    async fn fetch_table(&self, count: usize) -> Result<Vec<StockQuote>> {
        self.simulate_request().await?;
        Ok(POPULAR_SYMBOLS
            .iter()
            .take(count)
            .map(|(symbol, _)| generate_quote(symbol))
            .collect())
    }
}

/// Quote with ±2% jitter around the symbol's base price
pub fn generate_quote(symbol: &str) -> StockQuote {
    let base = base_price(symbol);
    let mut rng = rand::thread_rng();

    let volatility = 0.02;
    let change = (rng.gen::<f64>() - 0.5) * base * volatility * 2.0;
    let price = base + change;

    StockQuote {
        symbol: symbol.to_string(),
        name: company_name(symbol),
        price: round2(price),
        change: round2(change),
        change_percent: round2(change / base * 100.0),
        open: round2(base * (1.0 + (rng.gen::<f64>() - 0.5) * 0.01)),
        high: round2(price * (1.0 + rng.gen::<f64>() * 0.02)),
        low: round2(price * (1.0 - rng.gen::<f64>() * 0.02)),
        volume: rng.gen_range(10_000_000..60_000_000),
        market_cap: Some((base * rng.gen_range(50.0..150.0) * 1e9) as i64),
        pe: Some(round2(rng.gen::<f64>() * 40.0 + 10.0)),
        week52_high: Some(round2(price * (1.0 + rng.gen::<f64>() * 0.3))),
        week52_low: Some(round2(price * (1.0 - rng.gen::<f64>() * 0.2))),
    }
}

/// Intraday series at five-minute spacing ending now: a random walk with
/// mean reversion toward the symbol's base price
pub fn generate_chart(symbol: &str, points: usize) -> Vec<ChartPoint> {
    let base = base_price(symbol);
    let mut rng = rand::thread_rng();
    let now = Utc::now();

    let mut current = base;
    let mut data = Vec::with_capacity(points);

    for i in (0..points).rev() {
        let at = now - ChronoDuration::minutes(i as i64 * 5);

        let change = (rng.gen::<f64>() - 0.5) * base * 0.005;
        let reversion = (base - current) * 0.02;
        current += change + reversion;

        data.push(ChartPoint {
            time: at.format("%H:%M").to_string(),
            price: round2(current),
            volume: Some(rng.gen_range(500_000..1_500_000)),
        });
    }

    data
}

/// Base price for a symbol. Known symbols use a fixed table; unknown
/// symbols get a stable value derived from the symbol text so repeated
/// fetches stay in the same neighbourhood.
fn base_price(symbol: &str) -> f64 {
    match symbol {
        "AAPL" => 178.50,
        "GOOGL" => 141.25,
        "MSFT" => 378.90,
        "AMZN" => 178.35,
        "TSLA" => 248.75,
        "META" => 505.60,
        "NVDA" => 875.40,
        "JPM" => 195.80,
        "V" => 275.50,
        "WMT" => 165.30,
        "NFLX" => 485.20,
        "DIS" => 112.45,
        _ => {
            let seed: u32 = symbol.bytes().map(u32::from).sum();
            100.0 + (seed % 200) as f64
        }
    }
}

fn company_name(symbol: &str) -> String {
    POPULAR_SYMBOLS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("{} Corporation", symbol))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_stays_near_base_price() {
        for _ in 0..50 {
            let quote = generate_quote("AAPL");
            assert_eq!(quote.symbol, "AAPL");
            assert_eq!(quote.name, "Apple Inc.");
            assert!((quote.price - 178.50).abs() <= 178.50 * 0.02 + 0.01);
            assert!(quote.high >= quote.price - 0.01);
            assert!(quote.low <= quote.price + 0.01);
        }
    }

    #[test]
    fn test_unknown_symbol_has_stable_base() {
        let a = generate_quote("ZZZZ");
        let b = generate_quote("ZZZZ");
        assert_eq!(a.name, "ZZZZ Corporation");
        // Both jitter around the same derived base
        assert!((a.price - b.price).abs() < a.price * 0.05);
    }

    #[test]
    fn test_chart_has_requested_points() {
        let series = generate_chart("MSFT", 30);
        assert_eq!(series.len(), 30);
        for point in &series {
            assert!(point.price > 0.0);
            assert!(point.volume.unwrap() >= 500_000);
        }
    }

    #[tokio::test]
    async fn test_provider_serves_quotes_without_failures() {
        let provider = MockQuoteProvider::new()
            .with_failure_rate(0.0)
            .without_latency();

        let quote = provider.fetch_quote("NVDA").await.unwrap();
        assert_eq!(quote.symbol, "NVDA");

        let table = provider.fetch_table(5).await.unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table[0].symbol, "AAPL");
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces_as_fetch_error() {
        let provider = MockQuoteProvider::new()
            .with_failure_rate(1.0)
            .without_latency();

        let err = provider.fetch_quote("AAPL").await.unwrap_err();
        assert!(matches!(err, AppError::Fetch(_)));
    }
}
