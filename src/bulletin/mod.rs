// src/bulletin/mod.rs
//! Fetch → decode → parse → filter, one cycle per call.

pub mod decode;
pub mod error;
pub mod filter;
pub mod parser;
pub mod source;
pub mod types;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use encoding_rs::Encoding;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::config::feed::FeedConfig;
use error::BulletinError;
use source::{BulletinSource, HttpBulletinSource};
use types::EarthquakeRecord;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("bulletin_fetch_total", "Bulletin fetch cycles started.");
        describe_counter!(
            "bulletin_fetch_errors_total",
            "Bulletin fetch/decode failures."
        );
        describe_counter!("bulletin_records_total", "Records parsed from the bulletin.");
        describe_counter!(
            "bulletin_kept_total",
            "Records kept after the magnitude filter."
        );
        describe_counter!(
            "bulletin_lines_skipped_total",
            "Bulletin lines skipped, by reason."
        );
        describe_histogram!("bulletin_parse_ms", "Bulletin parse time in milliseconds.");
        describe_gauge!(
            "bulletin_last_fetch_ts",
            "Unix ts of the last successful bulletin fetch."
        );
    });
}

/// The filtered record set produced by one fetch cycle.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub fetched_at: DateTime<Utc>,
    pub records: Vec<EarthquakeRecord>,
    pub parsed: usize,
    pub skipped: usize,
}

pub struct BulletinPipeline {
    source: Arc<dyn BulletinSource>,
    encoding: &'static Encoding,
    header_lines: usize,
    min_ml: f64,
}

impl BulletinPipeline {
    pub fn new(source: Arc<dyn BulletinSource>, cfg: &FeedConfig) -> Self {
        Self {
            source,
            encoding: cfg.encoding(),
            header_lines: cfg.header_lines,
            min_ml: cfg.min_magnitude,
        }
    }

    /// Pipeline reading from the configured upstream URL.
    pub fn from_config(cfg: &FeedConfig) -> Result<Self, BulletinError> {
        let http = HttpBulletinSource::new(cfg.source_url.clone(), cfg.fetch_timeout())?;
        Ok(Self::new(Arc::new(http), cfg))
    }

    pub fn min_ml(&self) -> f64 {
        self.min_ml
    }

    /// Run one cycle. Line problems are absorbed; fetch/decode problems are returned.
    pub async fn run_once(&self) -> Result<Snapshot, BulletinError> {
        ensure_metrics_described();
        counter!("bulletin_fetch_total").increment(1);

        let raw = self.source.fetch_raw().await?;
        let body = decode::decode_body(&raw, self.encoding).inspect_err(|e| {
            tracing::warn!(target: "bulletin", error = %e, source = self.source.name(), "decode failed");
            counter!("bulletin_fetch_errors_total").increment(1);
        })?;

        let t0 = std::time::Instant::now();
        let listing = decode::extract_listing(&body);
        let report = parser::parse_bulletin(&listing, self.header_lines);
        histogram!("bulletin_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let parsed = report.records.len();
        let skipped = report.skipped();
        counter!("bulletin_records_total").increment(parsed as u64);
        for (reason, n) in [
            ("malformed", report.malformed),
            ("parse", report.unparseable),
            ("invalid", report.invalid),
        ] {
            if n > 0 {
                counter!("bulletin_lines_skipped_total", "reason" => reason).increment(n as u64);
            }
        }

        let records = filter::filter_by_ml(report.records, self.min_ml);
        counter!("bulletin_kept_total").increment(records.len() as u64);

        let now = Utc::now();
        gauge!("bulletin_last_fetch_ts").set(now.timestamp() as f64);

        tracing::info!(
            target: "bulletin",
            source = self.source.name(),
            parsed,
            kept = records.len(),
            skipped,
            "bulletin cycle"
        );

        Ok(Snapshot {
            fetched_at: now,
            records,
            parsed,
            skipped,
        })
    }
}
