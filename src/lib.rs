// src/lib.rs
// Public library surface for integration tests and the binaries.

pub mod api;
pub mod bulletin;
pub mod config;
pub mod metrics;
pub mod novelty;
pub mod predict;

// Consumer side: polling, novelty alerts, notification channels
pub mod notify;
pub mod watcher;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::bulletin::types::{EarthquakeRecord, Magnitude, QuakeId, Severity};
pub use crate::bulletin::{BulletinPipeline, Snapshot};
pub use crate::config::FeedConfig;
pub use crate::notify::{NotifierMux, QuakeAlert};
pub use crate::novelty::{NoveltyDetector, NoveltyEvent};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs (`LOG_FORMAT=json` for JSON lines); `RUST_LOG` overrides
/// the default filter. Safe to call more than once (later calls are no-ops).
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quake_feed=info,warn"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}
