use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use super::extract::{AppJson, AppPath};
use super::AppState;
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{Id, Routine, RoutineCreate, RoutineUpdate};

pub(super) async fn create(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppJson(body): AppJson<RoutineCreate>,
) -> AppResult<(StatusCode, Json<Routine>)> {
    body.validate()?;
    Ok((StatusCode::CREATED, Json(state.store.create_routine(uid, body))))
}

pub(super) async fn list(State(state): State<AppState>, AuthUser(uid): AuthUser) -> Json<Vec<Routine>> {
    Json(state.store.routines(uid))
}

pub(super) async fn get_one(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppPath(id): AppPath<Id>,
) -> AppResult<Json<Routine>> {
    Ok(Json(state.store.routine(uid, id)?))
}

pub(super) async fn update(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppPath(id): AppPath<Id>,
    AppJson(body): AppJson<RoutineUpdate>,
) -> AppResult<Json<Routine>> {
    body.validate()?;
    Ok(Json(state.store.update_routine(uid, id, body)?))
}

pub(super) async fn delete(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppPath(id): AppPath<Id>,
) -> AppResult<StatusCode> {
    state.store.delete_routine(uid, id)?;
    Ok(StatusCode::NO_CONTENT)
}
