use anyhow::{bail, Context, Result};
use chrono::Utc;
use metrics::counter;
use serde::Deserialize;
use tokio::{task::JoinHandle, time};

use crate::bulletin::types::EarthquakeRecord;
use crate::config::FeedConfig;
use crate::novelty::{NoveltyDetector, NoveltyEvent};
use crate::notify::{NotifierMux, QuakeAlert};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Polls the served quake list and alerts on records it has not seen before.
pub struct QuakeWatcher {
    endpoint: String,
    client: reqwest::Client,
    detector: NoveltyDetector,
    mux: NotifierMux,
}

impl QuakeWatcher {
    pub fn new(cfg: &FeedConfig, mux: NotifierMux) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.fetch_timeout())
            .build()
            .context("build watcher http client")?;
        Ok(Self {
            endpoint: cfg.watch_endpoint.clone(),
            client,
            detector: NoveltyDetector::new(cfg.seen_capacity, cfg.fresh_window()),
            mux,
        })
    }

    pub fn detector(&self) -> &NoveltyDetector {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut NoveltyDetector {
        &mut self.detector
    }

    async fn fetch_snapshot(&self) -> Result<Vec<EarthquakeRecord>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .context("fetch quake list")?;
        let status = resp.status();
        let body = resp.text().await.context("read quake list body")?;

        if !status.is_success() {
            let msg = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or(body);
            bail!("quake list returned {status}: {msg}");
        }

        serde_json::from_str(&body).context("parse quake list JSON")
    }

    /// One tick: fetch, diff, notify. Returns the novelty events raised.
    pub async fn poll_once(&mut self) -> Result<Vec<NoveltyEvent>> {
        let snapshot = self.fetch_snapshot().await?;
        let events = self.detector.observe(&snapshot, Utc::now());
        for ev in &events {
            self.mux.notify(&QuakeAlert::from(ev)).await;
        }
        Ok(events)
    }
}

/// Fixed-interval loop. A failed tick is logged and the next tick proceeds as usual.
pub async fn run_quake_watcher(cfg: FeedConfig, mux: NotifierMux) -> Result<()> {
    let mut watcher = QuakeWatcher::new(&cfg, mux)?;
    let mut ticker = time::interval(cfg.poll_interval());

    tracing::info!(
        target: "watcher",
        endpoint = %cfg.watch_endpoint,
        every_secs = cfg.poll_interval_secs,
        channels = ?watcher.mux.channel_names(),
        "quake watcher started"
    );

    loop {
        ticker.tick().await;
        match watcher.poll_once().await {
            Ok(evs) if evs.is_empty() => tracing::trace!(target: "watcher", "no new quakes"),
            Ok(evs) => tracing::debug!(target: "watcher", new = evs.len(), "tick done"),
            Err(e) => {
                counter!("watcher_poll_errors_total").increment(1);
                tracing::warn!(target: "watcher", "watcher tick failed: {e:#}");
            }
        }
    }
}

pub fn spawn_quake_watcher(cfg: FeedConfig, mux: NotifierMux) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = run_quake_watcher(cfg, mux).await {
            tracing::error!(target: "watcher", "quake watcher stopped: {e:#}");
        }
    })
}
