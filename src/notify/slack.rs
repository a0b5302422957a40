use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use super::{Notifier, QuakeAlert};

pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
    timeout: Duration,
}

impl SlackNotifier {
    pub fn new(url: String) -> Self {
        Self {
            webhook_url: url,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, alert: &QuakeAlert) -> Result<()> {
        let r = &alert.record;
        let text = format!(
            "*{}*\n{}\n{} {} · ({:.4}, {:.4})",
            alert.title(),
            alert.body(),
            r.date,
            r.time,
            r.latitude,
            r.longitude
        );
        let body = serde_json::json!({ "text": text });

        self.client
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("slack post")?
            .error_for_status()
            .context("slack non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "slack"
    }
}
