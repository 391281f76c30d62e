// src/lib.rs
// Public library surface: the binary and integration tests both build the app from here.

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod metrics;
pub mod models;
pub mod scoring;
pub mod store;
pub mod weather;

pub use crate::api::{router, AppState};

use axum::Router;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AppConfig;
use crate::metrics::Metrics;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; `LOG_FORMAT=json` switches to JSON lines. A
/// subscriber installed earlier (e.g. by the deployment runtime) is kept.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("curl_routine_tracker=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Build the full application from environment configuration.
pub async fn app() -> anyhow::Result<Router> {
    let config = AppConfig::from_env()?;
    app_with_config(config)
}

pub fn app_with_config(config: AppConfig) -> anyhow::Result<Router> {
    let metrics_enabled = config.metrics_enabled;
    info!(
        weather_mode = ?config.weather_mode,
        metrics_enabled,
        cors_origins = config.cors_origins.len(),
        "building app"
    );

    let state = AppState::new(config)?;
    let mut router = api::router(state);
    if metrics_enabled {
        let metrics = Metrics::init()?;
        router = router.merge(metrics.router());
    }
    Ok(router)
}
