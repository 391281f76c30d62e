// tests/common/mod.rs
//
// Shared helpers: build the router in-process and drive it with
// tower::ServiceExt::oneshot (no sockets).
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt as _;

use curl_routine_tracker::auth::Sha256Hasher;
use curl_routine_tracker::config::{AppConfig, WeatherMode};
use curl_routine_tracker::weather::DynWeather;
use curl_routine_tracker::{api, AppState};

const BODY_LIMIT: usize = 1024 * 1024;

pub fn test_config() -> AppConfig {
    AppConfig {
        weather_mode: WeatherMode::Mock,
        ..AppConfig::default()
    }
}

fn state(config: AppConfig) -> AppState {
    AppState::new(config)
        .expect("state")
        // one round keeps hashing cheap in tests
        .with_hasher(Arc::new(Sha256Hasher::new(1)))
}

pub fn test_router() -> Router {
    api::router(state(test_config()))
}

pub fn router_with(config: AppConfig) -> Router {
    api::router(state(config))
}

pub fn router_with_weather(weather: DynWeather) -> Router {
    api::router(state(test_config()).with_weather(weather))
}

/// Fire one request; returns status and parsed JSON (Null for empty bodies).
pub async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string())),
        None => req.body(Body::empty()),
    }
    .expect("build request");

    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, v)
}

/// Register + login, returning the access token.
pub async fn signup(app: &Router, email: &str) -> String {
    signup_with(app, email, json!({})).await
}

pub async fn signup_with(app: &Router, email: &str, profile: Value) -> String {
    let mut body = json!({ "email": email, "password": "curls-all-day" });
    if let (Some(obj), Some(extra)) = (body.as_object_mut(), profile.as_object()) {
        for (k, v) in extra {
            obj.insert(k.clone(), v.clone());
        }
    }
    let (st, _) = call(app, Method::POST, "/api/v1/auth/register", None, Some(body)).await;
    assert_eq!(st, StatusCode::CREATED, "register {email}");

    let (st, tokens) = call(
        app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": "curls-all-day" })),
    )
    .await;
    assert_eq!(st, StatusCode::OK, "login {email}");
    tokens["access_token"].as_str().expect("access token").to_string()
}

pub async fn create_routine(app: &Router, token: &str, name: &str) -> u64 {
    let (st, v) = call(
        app,
        Method::POST,
        "/api/v1/routines",
        Some(token),
        Some(json!({
            "name": name,
            "steps": [{ "step_type": "cleanse", "order": 1 }],
            "method_tags": ["wash-and-go"]
        })),
    )
    .await;
    assert_eq!(st, StatusCode::CREATED, "create routine: {v}");
    v["id"].as_u64().unwrap()
}

pub async fn create_log(app: &Router, token: &str, body: Value) -> u64 {
    let (st, v) = call(app, Method::POST, "/api/v1/routine-logs", Some(token), Some(body)).await;
    assert_eq!(st, StatusCode::CREATED, "create log: {v}");
    v["id"].as_u64().unwrap()
}

pub async fn rate(app: &Router, token: &str, log_id: u64, f: u8, d: u8, s: u8) -> Value {
    let (st, v) = call(
        app,
        Method::POST,
        "/api/v1/outcomes",
        Some(token),
        Some(json!({ "routine_log_id": log_id, "frizz": f, "definition": d, "softness": s })),
    )
    .await;
    assert_eq!(st, StatusCode::CREATED, "rate log {log_id}: {v}");
    v
}
