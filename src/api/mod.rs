//! HTTP surface: shared state, router assembly and the unauthenticated routes.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::auth::{PasswordHasher, Sessions, Sha256Hasher};
use crate::config::AppConfig;
use crate::store::Store;
use crate::weather::{build_provider, DynWeather};

mod auth;
mod dashboard;
mod extract;
mod outcomes;
mod products;
mod routine_logs;
mod routines;
mod users;
mod weather;

pub const API_PREFIX: &str = "/api/v1";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub sessions: Arc<Sessions>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub weather: DynWeather,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let weather = build_provider(&config)?;
        Ok(Self {
            store: Arc::new(Store::new()),
            sessions: Arc::new(Sessions::new(config.access_ttl(), config.refresh_ttl())),
            hasher: Arc::new(Sha256Hasher::default()),
            weather,
            config: Arc::new(config),
        })
    }

    /// Swap the weather provider (tests, alternative backends).
    pub fn with_weather(mut self, weather: DynWeather) -> Self {
        self.weather = weather;
        self
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hasher = hasher;
        self
    }
}

/// Build the full application router for the given state.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let v1 = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/users/me", get(users::me).put(users::update_me))
        .route("/users/me/profile", axum::routing::put(users::update_profile))
        .route("/products", post(products::create).get(products::list))
        .route(
            "/products/{id}",
            get(products::get_one)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/products/{id}/star", post(products::toggle_star))
        .route("/routines", post(routines::create).get(routines::list))
        .route(
            "/routines/{id}",
            get(routines::get_one)
                .put(routines::update)
                .delete(routines::delete),
        )
        .route(
            "/routine-logs",
            post(routine_logs::create).get(routine_logs::list),
        )
        .route(
            "/routine-logs/{id}",
            get(routine_logs::get_one)
                .put(routine_logs::update)
                .delete(routine_logs::delete),
        )
        .route("/outcomes", post(outcomes::create).get(outcomes::list))
        .route(
            "/outcomes/{id}",
            get(outcomes::get_one)
                .put(outcomes::update)
                .delete(outcomes::delete),
        )
        .route("/weather/fetch", post(weather::fetch))
        .route("/weather", get(weather::list))
        .route("/weather/{id}", get(weather::get_one))
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/trends", get(dashboard::trends))
        .route("/dashboard/insights", get(dashboard::insights));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest(API_PREFIX, v1)
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "CurlLabs API", "version": env!("CARGO_PKG_VERSION") }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}
