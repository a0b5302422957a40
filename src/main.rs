//! quake-feed — Binary Entrypoint
//! Boots the Axum HTTP server that serves the filtered KOERI bulletin.

use quake_feed::{api, watcher, AppState, FeedConfig, NotifierMux};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    quake_feed::init_tracing();

    let cfg = FeedConfig::load_default()?;
    tracing::info!(
        source = %cfg.source_url,
        min_ml = cfg.min_magnitude,
        predict = cfg.predict_endpoint.is_some(),
        "quake-feed config loaded"
    );

    let state = AppState::from_config(&cfg)?;

    // Optional in-process watcher (otherwise run the `quake-watch` binary).
    if cfg.watcher_enabled {
        watcher::spawn_quake_watcher(cfg.clone(), NotifierMux::from_env());
    }

    let router = api::create_router(state);
    Ok(router.into())
}
