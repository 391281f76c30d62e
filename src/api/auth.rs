use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use super::extract::AppJson;
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{LoginRequest, RefreshRequest, Tokens, User, UserCreate};

pub(super) async fn register(
    State(state): State<AppState>,
    AppJson(body): AppJson<UserCreate>,
) -> AppResult<(StatusCode, Json<User>)> {
    body.validate()?;
    let hash = state.hasher.hash(&body.password);
    let user = state.store.create_user(&body.email, hash, body.profile)?;
    info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub(super) async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> AppResult<Json<Tokens>> {
    let user = state
        .store
        .user_by_email(&body.email)
        .filter(|u| state.hasher.verify(&body.password, &u.password_hash))
        .ok_or_else(|| AppError::Unauthorized("Incorrect email or password".into()))?;
    info!(user_id = user.id, "login");
    Ok(Json(state.sessions.issue(user.id)))
}

pub(super) async fn refresh(
    State(state): State<AppState>,
    AppJson(body): AppJson<RefreshRequest>,
) -> AppResult<Json<Tokens>> {
    let (user_id, tokens) = state.sessions.refresh(&body.refresh_token)?;
    if state.store.user(user_id).is_none() {
        return Err(AppError::Unauthorized("User not found".into()));
    }
    Ok(Json(tokens))
}
