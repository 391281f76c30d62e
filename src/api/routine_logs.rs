use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use super::extract::{AppJson, AppPath, AppQuery};
use super::AppState;
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{Id, LogQuery, RoutineLog, RoutineLogCreate, RoutineLogUpdate};

pub(super) async fn create(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppJson(body): AppJson<RoutineLogCreate>,
) -> AppResult<(StatusCode, Json<RoutineLog>)> {
    let log = state.store.create_log(uid, body)?;
    Ok((StatusCode::CREATED, Json(log)))
}

pub(super) async fn list(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppQuery(q): AppQuery<LogQuery>,
) -> Json<Vec<RoutineLog>> {
    Json(state.store.logs(uid, &q))
}

pub(super) async fn get_one(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppPath(id): AppPath<Id>,
) -> AppResult<Json<RoutineLog>> {
    Ok(Json(state.store.log(uid, id)?))
}

pub(super) async fn update(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppPath(id): AppPath<Id>,
    AppJson(body): AppJson<RoutineLogUpdate>,
) -> AppResult<Json<RoutineLog>> {
    Ok(Json(state.store.update_log(uid, id, body)?))
}

pub(super) async fn delete(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppPath(id): AppPath<Id>,
) -> AppResult<StatusCode> {
    state.store.delete_log(uid, id)?;
    Ok(StatusCode::NO_CONTENT)
}
