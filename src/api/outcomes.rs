use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use metrics::counter;
use tracing::debug;

use super::extract::{AppJson, AppPath};
use super::AppState;
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{Id, Outcome, OutcomeCreate, OutcomeUpdate};

pub(super) async fn create(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppJson(body): AppJson<OutcomeCreate>,
) -> AppResult<(StatusCode, Json<Outcome>)> {
    body.validate()?;
    let outcome = state.store.create_outcome(uid, body)?;
    counter!("outcomes_scored_total").increment(1);
    debug!(
        outcome_id = outcome.id,
        score = outcome.overall_score,
        "outcome scored"
    );
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub(super) async fn list(State(state): State<AppState>, AuthUser(uid): AuthUser) -> Json<Vec<Outcome>> {
    Json(state.store.outcomes(uid))
}

pub(super) async fn get_one(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppPath(id): AppPath<Id>,
) -> AppResult<Json<Outcome>> {
    Ok(Json(state.store.outcome(uid, id)?))
}

pub(super) async fn update(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppPath(id): AppPath<Id>,
    AppJson(body): AppJson<OutcomeUpdate>,
) -> AppResult<Json<Outcome>> {
    body.validate()?;
    let rescored = body.touches_ratings();
    let outcome = state.store.update_outcome(uid, id, body)?;
    if rescored {
        counter!("outcomes_scored_total").increment(1);
    }
    Ok(Json(outcome))
}

pub(super) async fn delete(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppPath(id): AppPath<Id>,
) -> AppResult<StatusCode> {
    state.store.delete_outcome(uid, id)?;
    Ok(StatusCode::NO_CONTENT)
}
