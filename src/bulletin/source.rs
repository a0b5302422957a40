// src/bulletin/source.rs
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;

use super::error::BulletinError;

pub const KOERI_URL: &str = "http://www.koeri.boun.edu.tr/scripts/lst0.asp";

const USER_AGENT: &str = concat!("quake-feed/", env!("CARGO_PKG_VERSION"));

/// Where raw bulletin bytes come from. One call = one retrieval, no retries.
#[async_trait]
pub trait BulletinSource: Send + Sync {
    async fn fetch_raw(&self) -> Result<Vec<u8>, BulletinError>;
    fn name(&self) -> &str;
}

pub struct HttpBulletinSource {
    url: String,
    client: reqwest::Client,
}

impl HttpBulletinSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, BulletinError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout.min(Duration::from_secs(4)))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl BulletinSource for HttpBulletinSource {
    async fn fetch_raw(&self) -> Result<Vec<u8>, BulletinError> {
        let resp = match self.client.get(&self.url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(target: "bulletin", error = ?e, url = %self.url, "bulletin http error");
                counter!("bulletin_fetch_errors_total").increment(1);
                return Err(e.into());
            }
        };

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(target: "bulletin", status = status.as_u16(), url = %self.url, "bulletin non-2xx");
            counter!("bulletin_fetch_errors_total").increment(1);
            return Err(BulletinError::Status(status.as_u16()));
        }

        // Raw bytes: charset decoding is ours, not reqwest's.
        let body = resp.bytes().await.inspect_err(|_| {
            counter!("bulletin_fetch_errors_total").increment(1);
        })?;
        Ok(body.to_vec())
    }

    fn name(&self) -> &str {
        "koeri-http"
    }
}

/// Serves a fixed body. Used for fixtures and tests.
#[derive(Debug, Clone)]
pub struct StaticBulletinSource {
    body: Vec<u8>,
}

impl StaticBulletinSource {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self { body: body.into() }
    }
}

#[async_trait]
impl BulletinSource for StaticBulletinSource {
    async fn fetch_raw(&self) -> Result<Vec<u8>, BulletinError> {
        Ok(self.body.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}
