use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Recipe, User, UserId},
    routes::{extract::AppJson, AppState},
    services::{catalog, users},
    validation,
};

/// Body shared by recipe create and update; fields stay loose until validated
#[derive(Debug, Deserialize)]
pub struct RecipeRequest {
    pub name: Option<Value>,
    pub ingredients: Option<Value>,
    pub taste_v: Option<Value>,
    pub featured: Option<Value>,
}

/// Body shared by user create and update
#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub email: Option<Value>,
    pub password: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub ok: bool,
    pub user: User,
}

pub async fn list_recipes(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Recipe>>> {
    Ok(Json(catalog::list_recipes(state.store.as_ref()).await?))
}

pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Recipe>> {
    let id = validation::recipe_id_param(&id)?;
    Ok(Json(catalog::get_recipe(state.store.as_ref(), id).await?))
}

pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    AppJson(request): AppJson<RecipeRequest>,
) -> AppResult<(StatusCode, Json<Recipe>)> {
    let recipe = validation::new_recipe(
        request.name.as_ref(),
        request.ingredients.as_ref(),
        request.taste_v.as_ref(),
        request.featured.as_ref(),
    )?;

    tracing::info!(request_id = %request_id, name = %recipe.name, "Creating recipe");

    let created = catalog::create_recipe(state.store.as_ref(), recipe).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(request): AppJson<RecipeRequest>,
) -> AppResult<Json<Recipe>> {
    let id = validation::recipe_id_param(&id)?;
    let patch = validation::recipe_patch(
        request.name.as_ref(),
        request.ingredients.as_ref(),
        request.taste_v.as_ref(),
        request.featured.as_ref(),
    )?;

    Ok(Json(catalog::update_recipe(state.store.as_ref(), id, patch).await?))
}

pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> AppResult<Json<OkResponse>> {
    let id = validation::recipe_id_param(&id)?;

    tracing::info!(request_id = %request_id, recipe_id = id, "Deleting recipe");

    catalog::delete_recipe(state.store.as_ref(), id).await?;
    Ok(Json(OkResponse { ok: true }))
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(users::list_users(state.store.as_ref()).await?))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    AppJson(request): AppJson<UserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let credentials =
        validation::user_credentials(request.email.as_ref(), request.password.as_ref())?;

    tracing::info!(request_id = %request_id, "Creating user");

    let user = users::create_user(state.store.as_ref(), credentials, state.password_cost).await?;
    Ok((StatusCode::CREATED, Json(UserResponse { ok: true, user })))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UserRequest>,
) -> AppResult<Json<UserResponse>> {
    let user_id = user_path_id(&id)?;
    let changes =
        validation::credential_changes(request.email.as_ref(), request.password.as_ref())?;

    tracing::info!(request_id = %request_id, user_id = %user_id, "Updating user");

    let user =
        users::update_user(state.store.as_ref(), &user_id, changes, state.password_cost).await?;
    Ok(Json(UserResponse { ok: true, user }))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> AppResult<Json<OkResponse>> {
    let user_id = user_path_id(&id)?;

    tracing::info!(request_id = %request_id, user_id = %user_id, "Deleting user");

    users::delete_user(state.store.as_ref(), &user_id).await?;
    Ok(Json(OkResponse { ok: true }))
}

fn user_path_id(id: &str) -> AppResult<UserId> {
    validation::user_id_param(Some(id))
        .map_err(|_| AppError::validation("invalid_id", "User id must not be blank."))
}
