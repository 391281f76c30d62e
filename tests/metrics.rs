// tests/metrics.rs
//
// The /metrics route is only mounted when enabled and exposes our counters.

mod common;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt as _;

use curl_routine_tracker::app_with_config;
use curl_routine_tracker::config::AppConfig;

use common::{create_log, rate, signup, test_config};

async fn scrape(app: &axum::Router) -> (StatusCode, String) {
    let req = Request::builder()
        .method(Method::GET)
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

#[tokio::test]
async fn metrics_route_is_absent_when_disabled() {
    let app = app_with_config(AppConfig {
        metrics_enabled: false,
        ..test_config()
    })
    .unwrap();
    let (st, _) = scrape(&app).await;
    assert_eq!(st, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn scored_outcomes_show_up_in_exposition() {
    let app = app_with_config(AppConfig {
        metrics_enabled: true,
        ..test_config()
    })
    .unwrap();

    let t = signup(&app, "metered@example.com").await;
    let log = create_log(&app, &t, json!({ "date": "2025-02-02" })).await;
    rate(&app, &t, log, 2, 4, 4).await;
    let (st, _) = common::call(&app, Method::GET, "/api/v1/dashboard/stats", Some(&t), None).await;
    assert_eq!(st, StatusCode::OK);

    let (st, text) = scrape(&app).await;
    assert_eq!(st, StatusCode::OK);
    assert!(text.contains("outcomes_scored_total"), "{text}");
    assert!(text.contains("dashboard_requests_total"), "{text}");
}
