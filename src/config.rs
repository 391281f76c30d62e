// src/config.rs
//! Service configuration.
//!
//! Resolution order:
//! 1) built-in defaults
//! 2) TOML file at $CURL_CONFIG_PATH, else `config/app.toml` if it exists
//! 3) individual environment variables (also picked up from `.env`)

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, fs};
use tracing::{info, warn};

pub const ENV_CONFIG_PATH: &str = "CURL_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

fn default_access_minutes() -> i64 {
    30
}
fn default_refresh_days() -> i64 {
    7
}
fn default_weather_api_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}
fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:3001".to_string(),
    ]
}

/// Which weather backend to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherMode {
    #[default]
    Live,
    /// Deterministic canned readings, no network.
    Mock,
}

impl FromStr for WeatherMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" | "" => Ok(Self::Live),
            "mock" => Ok(Self::Mock),
            other => Err(anyhow!("unknown weather mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_access_minutes")]
    pub access_token_expire_minutes: i64,
    #[serde(default = "default_refresh_days")]
    pub refresh_token_expire_days: i64,
    /// Empty means the live provider answers 503.
    #[serde(default)]
    pub weather_api_key: String,
    #[serde(default = "default_weather_api_url")]
    pub weather_api_url: String,
    #[serde(default)]
    pub weather_mode: WeatherMode,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    #[serde(default)]
    pub metrics_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            access_token_expire_minutes: default_access_minutes(),
            refresh_token_expire_days: default_refresh_days(),
            weather_api_key: String::new(),
            weather_api_url: default_weather_api_url(),
            weather_mode: WeatherMode::default(),
            cors_origins: default_cors_origins(),
            metrics_enabled: false,
        }
    }
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: AppConfig =
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// File (if any) plus environment overrides.
    pub fn from_env() -> Result<Self> {
        let base = match config_path()? {
            Some(p) => {
                info!(path = %p.display(), "loading config file");
                Self::load_from_file(&p)?
            }
            None => Self::default(),
        };
        base.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(v) = parse_var("ACCESS_TOKEN_EXPIRE_MINUTES")? {
            self.access_token_expire_minutes = v;
        }
        if let Some(v) = parse_var("REFRESH_TOKEN_EXPIRE_DAYS")? {
            self.refresh_token_expire_days = v;
        }
        if let Ok(v) = env::var("WEATHER_API_KEY") {
            self.weather_api_key = v.trim().to_string();
        }
        if let Ok(v) = env::var("WEATHER_API_URL") {
            self.weather_api_url = v.trim().trim_end_matches('/').to_string();
        }
        if let Some(v) = parse_var::<WeatherMode>("WEATHER_TEST_MODE")? {
            self.weather_mode = v;
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.cors_origins = split_list(&v);
        }
        if let Ok(v) = env::var("METRICS_ENABLED") {
            self.metrics_enabled = matches!(v.trim(), "1" | "true" | "yes");
        }
        Ok(self.sanitized())
    }

    fn sanitized(mut self) -> Self {
        if self.access_token_expire_minutes <= 0 {
            warn!("access_token_expire_minutes must be positive, using default");
            self.access_token_expire_minutes = default_access_minutes();
        }
        if self.refresh_token_expire_days <= 0 {
            warn!("refresh_token_expire_days must be positive, using default");
            self.refresh_token_expire_days = default_refresh_days();
        }
        self.weather_api_url = self.weather_api_url.trim_end_matches('/').to_string();
        self
    }

    pub fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_token_expire_minutes)
    }

    pub fn refresh_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.refresh_token_expire_days)
    }
}

fn config_path() -> Result<Option<PathBuf>> {
    if let Ok(p) = env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(Some(pb));
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    Ok(default.exists().then_some(default))
}

fn parse_var<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("invalid {key} value: {e}")),
        Err(_) => Ok(None),
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 8] = [
        ENV_CONFIG_PATH,
        "ACCESS_TOKEN_EXPIRE_MINUTES",
        "REFRESH_TOKEN_EXPIRE_DAYS",
        "WEATHER_API_KEY",
        "WEATHER_API_URL",
        "WEATHER_TEST_MODE",
        "CORS_ORIGINS",
        "METRICS_ENABLED",
    ];

    fn clear_env() {
        for v in VARS {
            env::remove_var(v);
        }
    }

    #[test]
    fn list_splitting_trims_and_drops_empties() {
        assert_eq!(
            split_list(" http://a , ,http://b"),
            vec!["http://a".to_string(), "http://b".to_string()]
        );
    }

    #[test]
    fn file_values_fill_missing_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("app.toml");
        fs::write(
            &p,
            "weather_api_key = \"k\"\nweather_api_url = \"http://x/\"\naccess_token_expire_minutes = -5\n",
        )
        .unwrap();
        let cfg = AppConfig::load_from_file(&p).unwrap();
        assert_eq!(cfg.weather_api_key, "k");
        assert_eq!(cfg.weather_api_url, "http://x");
        assert_eq!(cfg.access_token_expire_minutes, 30);
        assert_eq!(cfg.refresh_token_expire_days, 7);
        assert_eq!(cfg.cors_origins.len(), 2);
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_file_and_defaults() {
        clear_env();
        env::set_var("ACCESS_TOKEN_EXPIRE_MINUTES", "5");
        env::set_var("WEATHER_TEST_MODE", "mock");
        env::set_var("CORS_ORIGINS", "https://curls.example");
        env::set_var("METRICS_ENABLED", "1");

        let cfg = AppConfig::default().with_env_overrides().unwrap();
        assert_eq!(cfg.access_token_expire_minutes, 5);
        assert_eq!(cfg.weather_mode, WeatherMode::Mock);
        assert_eq!(cfg.cors_origins, vec!["https://curls.example".to_string()]);
        assert!(cfg.metrics_enabled);
        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn bad_numbers_and_paths_are_errors() {
        clear_env();
        env::set_var("REFRESH_TOKEN_EXPIRE_DAYS", "soon");
        assert!(AppConfig::default().with_env_overrides().is_err());
        clear_env();

        env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
        assert!(AppConfig::from_env().is_err());
        clear_env();
    }
}
