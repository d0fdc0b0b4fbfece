//! FinBoard Desktop - Customizable Finance Dashboard
//!
//! The dashboard state and layout engine: widget model and validation, the
//! persistent dashboard store with export/import, grid-layout
//! reconciliation, and per-widget data refresh scheduling. Rendering,
//! drag/resize mechanics, and all visual styling live in the presentation
//! layer, which drives this crate through [`state::AppState`].

pub mod db;
pub mod error;
pub mod market;
pub mod model;
pub mod scheduler;
pub mod state;
pub mod store;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finboard_desktop=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
