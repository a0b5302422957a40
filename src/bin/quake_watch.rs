//! Standalone watcher: polls the served quake list and fans out alerts for new quakes.

use anyhow::Result;
use quake_feed::{watcher, FeedConfig, NotifierMux};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    quake_feed::init_tracing();

    let cfg = FeedConfig::load_default()?;
    watcher::run_quake_watcher(cfg, NotifierMux::from_env()).await
}
