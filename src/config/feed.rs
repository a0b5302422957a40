// src/config/feed.rs
use anyhow::{anyhow, Context, Result};
use encoding_rs::{Encoding, WINDOWS_1254};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use crate::bulletin::decode::{encoding_for_label, DEFAULT_ENCODING_LABEL};
use crate::bulletin::filter::DEFAULT_MIN_ML;
use crate::bulletin::parser::DEFAULT_HEADER_LINES;
use crate::bulletin::source::KOERI_URL;

pub const ENV_CONFIG_PATH: &str = "QUAKE_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/quake_feed.toml";
pub const DEFAULT_JSON_PATH: &str = "config/quake_feed.json";

fn default_source_url() -> String {
    KOERI_URL.to_string()
}
fn default_encoding() -> String {
    DEFAULT_ENCODING_LABEL.to_string()
}
fn default_min_magnitude() -> f64 {
    DEFAULT_MIN_ML
}
fn default_header_lines() -> usize {
    DEFAULT_HEADER_LINES
}
fn default_fetch_timeout_secs() -> u64 {
    10
}
fn default_poll_interval_secs() -> u64 {
    60
}
fn default_watch_endpoint() -> String {
    "http://127.0.0.1:8000/api/earthquakes".to_string()
}
fn default_seen_capacity() -> usize {
    5_000
}
fn default_fresh_window_ms() -> u64 {
    2_000
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedConfig {
    #[serde(default = "default_source_url")]
    pub source_url: String,
    /// WHATWG label of the bulletin charset.
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default = "default_min_magnitude")]
    pub min_magnitude: f64,
    #[serde(default = "default_header_lines")]
    pub header_lines: usize,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Served endpoint the watcher polls.
    #[serde(default = "default_watch_endpoint")]
    pub watch_endpoint: String,
    #[serde(default = "default_seen_capacity")]
    pub seen_capacity: usize,
    #[serde(default = "default_fresh_window_ms")]
    pub fresh_window_ms: u64,
    #[serde(default)]
    pub predict_endpoint: Option<String>,
    /// Run the watcher inside the server process.
    #[serde(default)]
    pub watcher_enabled: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source_url: default_source_url(),
            encoding: default_encoding(),
            min_magnitude: default_min_magnitude(),
            header_lines: default_header_lines(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            watch_endpoint: default_watch_endpoint(),
            seen_capacity: default_seen_capacity(),
            fresh_window_ms: default_fresh_window_ms(),
            predict_endpoint: None,
            watcher_enabled: false,
        }
    }
}

impl FeedConfig {
    /// Load from an explicit path. Supports TOML or JSON.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading feed config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg: FeedConfig = if ext == "json" {
            serde_json::from_str(&content).context("parsing feed config json")?
        } else {
            toml::from_str(&content).context("parsing feed config toml")?
        };
        cfg.finish()
    }

    /// Resolution order:
    /// 1) $QUAKE_CONFIG_PATH
    /// 2) config/quake_feed.toml
    /// 3) config/quake_feed.json
    /// 4) built-in defaults
    ///
    /// Env overrides are applied on top in every case.
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else if Path::new(DEFAULT_TOML_PATH).exists() {
            Self::load_from(Path::new(DEFAULT_TOML_PATH))?
        } else if Path::new(DEFAULT_JSON_PATH).exists() {
            Self::load_from(Path::new(DEFAULT_JSON_PATH))?
        } else {
            Self::default()
        };
        base.with_env_overrides().finish()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("QUAKE_SOURCE_URL") {
            self.source_url = v;
        }
        if let Some(v) = env_parse::<f64>("QUAKE_MIN_ML") {
            self.min_magnitude = v;
        }
        if let Some(v) = env_parse::<u64>("QUAKE_FETCH_TIMEOUT_SECS") {
            self.fetch_timeout_secs = v;
        }
        if let Some(v) = env_parse::<u64>("QUAKE_POLL_INTERVAL_SECS") {
            self.poll_interval_secs = v;
        }
        if let Ok(v) = env::var("QUAKE_ENDPOINT") {
            self.watch_endpoint = v;
        }
        if let Ok(v) = env::var("PREDICT_ENDPOINT") {
            self.predict_endpoint = Some(v);
        }
        if let Ok(v) = env::var("QUAKE_WATCHER") {
            self.watcher_enabled = v == "1" || v.eq_ignore_ascii_case("true");
        }
        self
    }

    /// Validate the charset and sanitize numeric knobs.
    fn finish(mut self) -> Result<Self> {
        if encoding_for_label(&self.encoding).is_none() {
            return Err(anyhow!("unknown bulletin encoding label: {}", self.encoding));
        }
        if !self.min_magnitude.is_finite() || self.min_magnitude < 0.0 {
            self.min_magnitude = default_min_magnitude();
        }
        if self.fetch_timeout_secs == 0 {
            self.fetch_timeout_secs = default_fetch_timeout_secs();
        }
        if self.poll_interval_secs == 0 {
            self.poll_interval_secs = default_poll_interval_secs();
        }
        if self.seen_capacity == 0 {
            self.seen_capacity = default_seen_capacity();
        }
        self.predict_endpoint = self
            .predict_endpoint
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(self)
    }

    pub fn encoding(&self) -> &'static Encoding {
        encoding_for_label(&self.encoding).unwrap_or(WINDOWS_1254)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fresh_window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.fresh_window_ms as i64)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
