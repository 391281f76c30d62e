use axum::{extract::State, Json};

use super::extract::AppJson;
use super::AppState;
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::{HairProfile, User, UserUpdate};

pub(super) async fn me(State(state): State<AppState>, AuthUser(uid): AuthUser) -> AppResult<Json<User>> {
    state
        .store
        .user(uid)
        .map(Json)
        .ok_or(AppError::NotFound("User"))
}

pub(super) async fn update_me(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppJson(body): AppJson<UserUpdate>,
) -> AppResult<Json<User>> {
    body.validate()?;
    Ok(Json(state.store.update_user(uid, body)?))
}

pub(super) async fn update_profile(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppJson(body): AppJson<HairProfile>,
) -> AppResult<Json<User>> {
    Ok(Json(state.store.update_profile(uid, body)?))
}
