// src/notify/mod.rs
//! Alert fan-out for newly detected quakes.

pub mod discord;
pub mod email;
pub mod slack;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::bulletin::types::{EarthquakeRecord, Severity};
use crate::novelty::NoveltyEvent;

/// What gets sent for one new quake.
#[derive(Debug, Clone)]
pub struct QuakeAlert {
    pub record: EarthquakeRecord,
    pub severity: Severity,
    pub ts: DateTime<Utc>,
}

impl QuakeAlert {
    pub fn title(&self) -> String {
        format!("Yeni Deprem: {}", self.record.location)
    }

    pub fn body(&self) -> String {
        format!(
            "Büyüklük: {}\nDerinlik: {} km",
            self.record.magnitude_ml.value(),
            self.record.depth_km
        )
    }
}

impl From<&NoveltyEvent> for QuakeAlert {
    fn from(ev: &NoveltyEvent) -> Self {
        Self {
            severity: ev.record.severity(),
            record: ev.record.clone(),
            ts: ev.detected_at,
        }
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, alert: &QuakeAlert) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Always-on channel: writes the alert to the log.
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, alert: &QuakeAlert) -> Result<()> {
        tracing::info!(
            target: "notify",
            id = %alert.record.id(),
            ml = alert.record.magnitude_ml.value(),
            severity = ?alert.severity,
            "{}",
            alert.title()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Sends to every configured channel. A failing channel is logged and skipped.
pub struct NotifierMux {
    channels: Vec<Box<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self { channels }
    }

    /// Log channel plus whatever webhooks / SMTP the environment enables.
    pub fn from_env() -> Self {
        let mut channels: Vec<Box<dyn Notifier>> = vec![Box::new(LogNotifier)];
        if let Ok(url) = std::env::var("SLACK_WEBHOOK_URL") {
            channels.push(Box::new(slack::SlackNotifier::new(url)));
        }
        if let Ok(url) = std::env::var("DISCORD_WEBHOOK_URL") {
            channels.push(Box::new(discord::DiscordNotifier::new(url)));
        }
        match email::EmailSender::from_env() {
            Ok(Some(sender)) => channels.push(Box::new(sender)),
            Ok(None) => tracing::debug!("email disabled (SMTP env incomplete)"),
            Err(e) => tracing::warn!("email notifier not configured: {e:#}"),
        }
        Self { channels }
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    pub async fn notify(&self, alert: &QuakeAlert) {
        for ch in &self.channels {
            if let Err(e) = ch.send(alert).await {
                tracing::warn!(target: "notify", channel = ch.name(), "notify failed: {e:#}");
            }
        }
    }
}
