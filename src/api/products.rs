use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::extract::{AppJson, AppPath, AppQuery};
use super::AppState;
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{Id, Product, ProductCreate, ProductUpdate};

#[derive(Debug, Default, Deserialize)]
pub(super) struct ListQuery {
    #[serde(default)]
    starred: bool,
}

pub(super) async fn create(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppJson(body): AppJson<ProductCreate>,
) -> AppResult<(StatusCode, Json<Product>)> {
    body.validate()?;
    Ok((StatusCode::CREATED, Json(state.store.create_product(uid, body))))
}

pub(super) async fn list(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppQuery(q): AppQuery<ListQuery>,
) -> Json<Vec<Product>> {
    Json(state.store.products(uid, q.starred))
}

pub(super) async fn get_one(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppPath(id): AppPath<Id>,
) -> AppResult<Json<Product>> {
    Ok(Json(state.store.product(uid, id)?))
}

pub(super) async fn update(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppPath(id): AppPath<Id>,
    AppJson(body): AppJson<ProductUpdate>,
) -> AppResult<Json<Product>> {
    body.validate()?;
    Ok(Json(state.store.update_product(uid, id, body)?))
}

pub(super) async fn toggle_star(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppPath(id): AppPath<Id>,
) -> AppResult<Json<Product>> {
    Ok(Json(state.store.toggle_star(uid, id)?))
}

pub(super) async fn delete(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    AppPath(id): AppPath<Id>,
) -> AppResult<StatusCode> {
    state.store.delete_product(uid, id)?;
    Ok(StatusCode::NO_CONTENT)
}
