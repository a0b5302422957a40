// src/predict.rs
//! Client for the external magnitude-prediction service.
//!
//! The service is opaque to us: it takes six numeric features and answers
//! with a predicted MD magnitude. Field names match its JSON contract.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(rename = "xM")]
    pub x_m: f64,
    #[serde(rename = "Mb")]
    pub mb: f64,
    #[serde(rename = "ML")]
    pub ml: f64,
    #[serde(rename = "Enlem")]
    pub latitude: f64,
    #[serde(rename = "Boylam")]
    pub longitude: f64,
    #[serde(rename = "Der(km)")]
    pub depth_km: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(rename = "tahmin_edilen_buyukluk_MD")]
    pub predicted_md: f64,
}

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("prediction endpoint is not configured")]
    NotConfigured,

    #[error("prediction request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("prediction service answered with status {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Clone)]
pub struct PredictionClient {
    endpoint: String,
    http: reqwest::Client,
}

impl PredictionClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PredictionError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(PredictionError::NotConfigured);
        }
        let http = reqwest::Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(4)))
            .timeout(timeout)
            .build()?;
        Ok(Self { endpoint, http })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn predict(&self, req: &PredictionRequest) -> Result<PredictionResponse, PredictionError> {
        let resp = self.http.post(&self.endpoint).json(req).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(target: "predict", status = status.as_u16(), "prediction non-2xx");
            return Err(PredictionError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json::<PredictionResponse>().await?)
    }
}
