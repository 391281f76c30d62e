use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::Utc;
use metrics::{counter, histogram};
use tracing::{info, warn};

use super::extract::{AppPath, AppQuery};
use super::AppState;
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::{DateRange, Id, WeatherFetchQuery, WeatherRecord};

/// Return the stored reading for (date, location) or fetch and store a new one.
pub(super) async fn fetch(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppQuery(q): AppQuery<WeatherFetchQuery>,
) -> AppResult<(StatusCode, Json<WeatherRecord>)> {
    let location = match q.location.map(|l| l.trim().to_string()) {
        Some(l) if !l.is_empty() => l,
        _ => state
            .store
            .user(uid)
            .and_then(|u| u.profile.location)
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(|| {
                AppError::BadRequest(
                    "Location not provided and user has no default location".into(),
                )
            })?,
    };

    if let Some(existing) = state.store.find_weather(uid, q.target_date, &location) {
        counter!("weather_fetch_total", "result" => "cached").increment(1);
        return Ok((StatusCode::OK, Json(existing)));
    }

    let started = Instant::now();
    let conditions = state.weather.current(&location).await.map_err(|e| {
        counter!("weather_fetch_total", "result" => "error").increment(1);
        warn!(provider = state.weather.name(), error = %e, "weather fetch failed");
        e
    })?;
    histogram!("weather_fetch_duration_ms").record(started.elapsed().as_secs_f64() * 1000.0);
    counter!("weather_fetch_total", "result" => "fetched").increment(1);

    let (record, inserted) = state.store.insert_weather(WeatherRecord {
        id: 0,
        user_id: uid,
        date: q.target_date,
        location,
        humidity: conditions.humidity,
        dew_point: conditions.dew_point,
        temperature: conditions.temperature,
        wind_speed: Some(conditions.wind_speed),
        created_at: Utc::now(),
    });
    if !inserted {
        // a concurrent fetch stored this reading first
        return Ok((StatusCode::OK, Json(record)));
    }
    info!(
        user_id = uid,
        date = %record.date,
        humidity = record.humidity,
        "weather stored"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

pub(super) async fn list(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppQuery(range): AppQuery<DateRange>,
) -> Json<Vec<WeatherRecord>> {
    Json(state.store.weather(uid, &range))
}

pub(super) async fn get_one(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppPath(id): AppPath<Id>,
) -> AppResult<Json<WeatherRecord>> {
    Ok(Json(state.store.weather_record(uid, id)?))
}
