// tests/watcher_e2e.rs
//
// Watcher polling a real in-process server over TCP; prediction pass-through
// against a stub prediction service.

mod common;

use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::{routing::post, Json, Router};
use quake_feed::api::{self, AppState};
use quake_feed::notify::{Notifier, NotifierMux, QuakeAlert};
use quake_feed::predict::{PredictionClient, PredictionRequest, PredictionResponse};
use quake_feed::watcher::QuakeWatcher;
use quake_feed::FeedConfig;

const A: &str = "2024.10.20 12:00:00 40.0 29.0 5.0 -.- 2.0 -.- YER A İlksel";
const B: &str = "2024.10.20 12:05:00 40.1 29.1 6.0 -.- 2.5 -.- YER B İlksel";
const SMALL: &str = "2024.10.20 12:07:00 40.1 29.1 6.0 -.- 1.0 -.- KUCUK";
const C: &str = "2024.10.20 12:10:00 40.2 29.2 7.0 -.- 4.8 -.- YER C";

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<QuakeAlert>>>);

#[async_trait::async_trait]
impl Notifier for Recorder {
    async fn send(&self, alert: &QuakeAlert) -> Result<()> {
        self.0.lock().unwrap().push(alert.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn watcher_bootstraps_then_alerts_once_per_new_quake() {
    let source = common::SequenceSource::new(vec![
        common::plain_bulletin(&[A]).into_bytes(),
        common::plain_bulletin(&[B, A]).into_bytes(),
        common::plain_bulletin(&[SMALL, B, A]).into_bytes(),
        common::plain_bulletin(&[C, SMALL, B, A]).into_bytes(),
    ]);
    let base = serve(api::create_router(AppState::new(common::pipeline_with(source)))).await;

    let cfg = FeedConfig {
        watch_endpoint: format!("{base}/api/earthquakes"),
        ..FeedConfig::default()
    };
    let rec = Recorder::default();
    let mux = NotifierMux::new(vec![Box::new(rec.clone())]);
    let mut w = QuakeWatcher::new(&cfg, mux).unwrap();

    assert!(w.poll_once().await.unwrap().is_empty(), "bootstrap must be silent");

    let evs = w.poll_once().await.unwrap();
    assert_eq!(evs.len(), 1);
    assert_eq!(evs[0].record.location, "YER B");

    // Below-threshold quake never reaches the consumer.
    assert!(w.poll_once().await.unwrap().is_empty());

    let evs = w.poll_once().await.unwrap();
    assert_eq!(evs.len(), 1);
    assert_eq!(evs[0].record.location, "YER C");

    // Upstream now repeats the last listing; nothing new.
    assert!(w.poll_once().await.unwrap().is_empty());

    let alerts = rec.0.lock().unwrap();
    let titles: Vec<_> = alerts.iter().map(|a| a.title()).collect();
    assert_eq!(titles, vec!["Yeni Deprem: YER B", "Yeni Deprem: YER C"]);
    assert_eq!(alerts[1].body(), "Büyüklük: 4.8\nDerinlik: 7 km");
    assert_eq!(w.detector().len(), 3);
}

#[tokio::test]
async fn watcher_tick_fails_cleanly_on_server_error() {
    let base = serve(api::create_router(AppState::new(common::pipeline_with(
        common::DownSource,
    ))))
    .await;
    let cfg = FeedConfig {
        watch_endpoint: format!("{base}/api/earthquakes"),
        ..FeedConfig::default()
    };
    let mut w = QuakeWatcher::new(&cfg, NotifierMux::new(vec![])).unwrap();

    let err = w.poll_once().await.unwrap_err();
    assert!(format!("{err:#}").contains("Deprem verileri alınamadı."));
    assert!(w.detector().is_empty());
}

#[tokio::test]
async fn predict_route_forwards_to_prediction_service() {
    let stub = Router::new().route(
        "/predict",
        post(|Json(req): Json<PredictionRequest>| async move {
            Json(PredictionResponse {
                predicted_md: req.ml + 0.25,
            })
        }),
    );
    let stub_base = serve(stub).await;

    let client = PredictionClient::new(
        format!("{stub_base}/predict"),
        std::time::Duration::from_secs(5),
    )
    .unwrap();
    let state = AppState::new(common::fixture_pipeline()).with_predictor(client);
    let base = serve(api::create_router(state)).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/predict"))
        .json(&serde_json::json!({
            "xM": 3.1, "Mb": 0.0, "ML": 3.0, "Enlem": 40.1, "Boylam": 29.2, "Der(km)": 7.0
        }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let v: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(v["tahmin_edilen_buyukluk_MD"], 3.25);
}

#[tokio::test]
async fn predict_route_maps_unreachable_service_to_502() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let client = PredictionClient::new(
        format!("http://127.0.0.1:{port}/predict"),
        std::time::Duration::from_secs(2),
    )
    .unwrap();
    let state = AppState::new(common::fixture_pipeline()).with_predictor(client);
    let base = serve(api::create_router(state)).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/predict"))
        .json(&serde_json::json!({
            "xM": 1.0, "Mb": 1.0, "ML": 1.0, "Enlem": 1.0, "Boylam": 1.0, "Der(km)": 1.0
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 502);
}
