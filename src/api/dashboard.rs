use axum::{
    extract::State,
    Json,
};
use chrono::Local;
use metrics::counter;
use serde::{Deserialize, Serialize};

use super::extract::AppQuery;
use super::AppState;
use crate::auth::AuthUser;
use crate::dashboard::{self, DashboardStats, Insight, TrendPoint, DEFAULT_TREND_DAYS};
use crate::error::{AppError, AppResult};
use crate::models::DateRange;

const MAX_TREND_DAYS: i64 = 3650;

fn default_days() -> i64 {
    DEFAULT_TREND_DAYS
}

#[derive(Debug, Deserialize)]
pub(super) struct TrendQuery {
    #[serde(default = "default_days")]
    days: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct TrendsResp {
    trends: Vec<TrendPoint>,
}

#[derive(Debug, Serialize)]
pub(super) struct InsightsResp {
    insights: Vec<Insight>,
}

pub(super) async fn stats(State(state): State<AppState>, AuthUser(uid): AuthUser) -> Json<DashboardStats> {
    counter!("dashboard_requests_total", "view" => "stats").increment(1);
    let rows = state.store.rated_logs(uid);
    Json(dashboard::dashboard_stats(
        state.store.count_logs(uid),
        &rows,
        &state.store.routines(uid),
        &state.store.products(uid, false),
    ))
}

pub(super) async fn trends(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppQuery(q): AppQuery<TrendQuery>,
) -> AppResult<Json<TrendsResp>> {
    if !(1..=MAX_TREND_DAYS).contains(&q.days) {
        return Err(AppError::validation(format!(
            "days must be between 1 and {MAX_TREND_DAYS}"
        )));
    }
    counter!("dashboard_requests_total", "view" => "trends").increment(1);
    let rows = state.store.rated_logs(uid);
    let today = Local::now().date_naive();
    Ok(Json(TrendsResp {
        trends: dashboard::trends(&rows, today, q.days),
    }))
}

pub(super) async fn insights(State(state): State<AppState>, AuthUser(uid): AuthUser) -> Json<InsightsResp> {
    counter!("dashboard_requests_total", "view" => "insights").increment(1);
    let rows = state.store.rated_logs(uid);
    let weather = state.store.weather(uid, &DateRange::default());
    Json(InsightsResp {
        insights: dashboard::insights(&rows, &weather),
    })
}
