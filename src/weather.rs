//! Weather lookups: provider abstraction + OpenWeatherMap client + mock.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{AppConfig, WeatherMode};
use crate::error::AppError;

/// Current conditions at a location, metric units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub humidity: f64,
    pub dew_point: f64,
    pub temperature: f64,
    pub wind_speed: f64,
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Weather API key not configured")]
    NotConfigured,
    #[error("Failed to fetch weather data: {0}")]
    Upstream(String),
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        AppError::ServiceUnavailable(e.to_string())
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, location: &str) -> Result<Conditions, WeatherError>;
    /// Provider name for diagnostics/metrics.
    fn name(&self) -> &'static str;
}

pub type DynWeather = Arc<dyn WeatherProvider>;

/// Factory: mock when configured, else the live client.
pub fn build_provider(cfg: &AppConfig) -> anyhow::Result<DynWeather> {
    match cfg.weather_mode {
        WeatherMode::Mock => Ok(Arc::new(MockWeatherProvider::default())),
        WeatherMode::Live => {
            if cfg.weather_api_key.is_empty() {
                warn!("WEATHER_API_KEY not set; weather fetches will answer 503");
            }
            let p = OpenWeatherProvider::new(&cfg.weather_api_url, &cfg.weather_api_key)?;
            Ok(Arc::new(p))
        }
    }
}

/// The city part of "city, state, country".
pub fn city_of(location: &str) -> &str {
    location.split(',').next().unwrap_or_default().trim()
}

/// Rough dew point when the API does not report one.
pub fn approx_dew_point(temperature: f64, humidity: f64) -> f64 {
    temperature - (100.0 - humidity) / 5.0
}

pub struct OpenWeatherProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherProvider {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("curl-routine-tracker/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .context("building weather http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    main: OwmMain,
    #[serde(default)]
    dew_point: Option<f64>,
    #[serde(default)]
    wind: Option<OwmWind>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    #[serde(default)]
    speed: Option<f64>,
}

impl From<OwmResponse> for Conditions {
    fn from(r: OwmResponse) -> Self {
        let humidity = r.main.humidity;
        let temperature = r.main.temp;
        Conditions {
            humidity,
            dew_point: r
                .dew_point
                .unwrap_or_else(|| approx_dew_point(temperature, humidity)),
            temperature,
            wind_speed: r.wind.and_then(|w| w.speed).unwrap_or(0.0),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, location: &str) -> Result<Conditions, WeatherError> {
        if self.api_key.is_empty() {
            return Err(WeatherError::NotConfigured);
        }
        let city = city_of(location);
        debug!(city, "fetching current weather");

        let body: OwmResponse = self
            .http
            .get(format!("{}/weather", self.base_url))
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| WeatherError::Upstream(e.without_url().to_string()))?
            .json()
            .await
            .map_err(|e| WeatherError::Upstream(e.without_url().to_string()))?;

        Ok(body.into())
    }

    fn name(&self) -> &'static str {
        "openweathermap"
    }
}

/// Canned conditions for tests/local runs.
#[derive(Clone)]
pub struct MockWeatherProvider {
    pub fixed: Conditions,
}

impl MockWeatherProvider {
    pub fn with(fixed: Conditions) -> Self {
        Self { fixed }
    }
}

impl Default for MockWeatherProvider {
    fn default() -> Self {
        Self::with(Conditions {
            humidity: 65.0,
            dew_point: 14.0,
            temperature: 21.0,
            wind_speed: 3.5,
        })
    }
}

#[async_trait]
impl WeatherProvider for MockWeatherProvider {
    async fn current(&self, _location: &str) -> Result<Conditions, WeatherError> {
        Ok(self.fixed)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
