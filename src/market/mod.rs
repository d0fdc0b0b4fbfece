//! Market data: provider seam, mock data source, display formatting

pub mod format;
pub mod mock;
pub mod provider;

pub use mock::MockQuoteProvider;
pub use provider::{ChartPoint, QuoteProvider, StockQuote};
