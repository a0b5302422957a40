// tests/metrics.rs
mod common;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use quake_feed::api::{self, AppState};
use quake_feed::metrics::Metrics;

#[tokio::test]
async fn metrics_endpoint_exposes_bulletin_series() {
    let metrics = Metrics::init().expect("install recorder");
    // A second init in the same process reuses the recorder.
    assert!(Metrics::init().is_ok());

    let app = api::create_router(AppState::new(common::fixture_pipeline()).with_metrics(metrics));

    let r = app
        .clone()
        .oneshot(Request::get("/api/earthquakes").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(r.status(), StatusCode::OK);

    let m = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(m.status(), StatusCode::OK);
    let body = body::to_bytes(m.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "bulletin_fetch_total",
        "bulletin_records_total",
        "bulletin_kept_total",
        "bulletin_lines_skipped_total",
        "bulletin_parse_ms",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}

#[tokio::test]
async fn metrics_route_absent_without_recorder() {
    let app = api::create_router(AppState::new(common::fixture_pipeline()));
    let r = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(r.status(), StatusCode::NOT_FOUND);
}
