use std::sync::{Arc, RwLock};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::bulletin::types::EarthquakeRecord;
use crate::bulletin::{BulletinPipeline, Snapshot};
use crate::config::FeedConfig;
use crate::metrics::Metrics;
use crate::predict::{PredictionClient, PredictionRequest, PredictionResponse};

/// Fixed user-facing message for a failed bulletin cycle.
pub const FETCH_FAILED_MESSAGE: &str = "Deprem verileri alınamadı.";
pub const PREDICT_FAILED_MESSAGE: &str = "Tahmin servisine ulaşılamadı.";
pub const PREDICT_DISABLED_MESSAGE: &str = "Tahmin servisi yapılandırılmamış.";

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<BulletinPipeline>,
    /// Last successful snapshot, replaced whole. Diagnostics only, never served as data.
    last: Arc<RwLock<Option<Arc<Snapshot>>>>,
    predictor: Option<PredictionClient>,
    metrics: Option<Metrics>,
}

impl AppState {
    pub fn new(pipeline: BulletinPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            last: Arc::new(RwLock::new(None)),
            predictor: None,
            metrics: None,
        }
    }

    /// Full production wiring from config: HTTP bulletin source, predictor, metrics.
    pub fn from_config(cfg: &FeedConfig) -> anyhow::Result<Self> {
        let pipeline = BulletinPipeline::from_config(cfg)?;
        let mut state = Self::new(pipeline).with_metrics(Metrics::init()?);
        if let Some(ep) = &cfg.predict_endpoint {
            state = state.with_predictor(PredictionClient::new(ep.clone(), cfg.fetch_timeout())?);
        }
        Ok(state)
    }

    pub fn with_predictor(mut self, client: PredictionClient) -> Self {
        self.predictor = Some(client);
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn last_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.last.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn store_snapshot(&self, snap: Arc<Snapshot>) {
        *self.last.write().unwrap_or_else(|p| p.into_inner()) = Some(snap);
    }
}

pub fn create_router(state: AppState) -> Router {
    let metrics = state.metrics.clone();

    let mut router: Router<AppState> = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/earthquakes", get(list_earthquakes))
        .route("/api/predict", post(predict))
        .route("/debug/last-snapshot", get(debug_last_snapshot));

    if let Some(m) = metrics {
        router = router.merge(m.router::<AppState>());
    }

    router.layer(CorsLayer::very_permissive()).with_state(state)
}

fn message(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "message": msg }))).into_response()
}

async fn list_earthquakes(State(state): State<AppState>) -> Response {
    match state.pipeline.run_once().await {
        Ok(snap) => {
            let snap = Arc::new(snap);
            state.store_snapshot(Arc::clone(&snap));
            Json::<Vec<EarthquakeRecord>>(snap.records.clone()).into_response()
        }
        Err(e) => {
            tracing::error!(target: "api", error = %e, "bulletin fetch failed");
            message(StatusCode::INTERNAL_SERVER_ERROR, FETCH_FAILED_MESSAGE)
        }
    }
}

#[derive(serde::Serialize)]
struct SnapshotInfo {
    fetched_at: DateTime<Utc>,
    count: usize,
    parsed: usize,
    skipped: usize,
    min_ml: f64,
}

async fn debug_last_snapshot(State(state): State<AppState>) -> Json<Option<SnapshotInfo>> {
    let info = state.last_snapshot().map(|s| SnapshotInfo {
        fetched_at: s.fetched_at,
        count: s.records.len(),
        parsed: s.parsed,
        skipped: s.skipped,
        min_ml: state.pipeline.min_ml(),
    });
    Json(info)
}

async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictionRequest>,
) -> Result<Json<PredictionResponse>, Response> {
    let Some(client) = &state.predictor else {
        return Err(message(StatusCode::SERVICE_UNAVAILABLE, PREDICT_DISABLED_MESSAGE));
    };
    client.predict(&req).await.map(Json).map_err(|e| {
        tracing::warn!(target: "api", error = %e, endpoint = client.endpoint(), "prediction failed");
        message(StatusCode::BAD_GATEWAY, PREDICT_FAILED_MESSAGE)
    })
}
