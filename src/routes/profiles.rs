use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{TasteProfile, TasteVector, UserId},
    routes::{
        extract::{AppJson, AppQuery},
        AppState,
    },
    services::profiles,
    validation,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsureProfileRequest {
    pub user_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceProfileRequest {
    pub user_id: Option<Value>,
    pub v: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: UserId,
    pub v: TasteVector,
    pub updated_at: DateTime<Utc>,
}

impl From<TasteProfile> for ProfileResponse {
    fn from(profile: TasteProfile) -> Self {
        Self {
            user_id: profile.user_id,
            v: profile.v,
            updated_at: profile.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReplaceProfileResponse {
    pub ok: bool,
    pub v: TasteVector,
}

/// Handler returning a user's stored taste profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<ProfileQuery>,
) -> AppResult<Json<ProfileResponse>> {
    let user_id = validation::user_id_param(query.user_id.as_deref())?;
    let profile = profiles::get_profile(state.store.as_ref(), &user_id).await?;
    Ok(Json(profile.into()))
}

/// Handler returning the user's profile, creating a neutral one if absent
pub async fn ensure_profile(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<EnsureProfileRequest>,
) -> AppResult<Json<ProfileResponse>> {
    let user_id = validation::user_id(request.user_id.as_ref()).ok_or_else(|| {
        AppError::validation("userId_required", "userId must be a valid id or string.")
    })?;
    let profile = profiles::ensure_profile(state.store.as_ref(), &user_id).await?;
    Ok(Json(profile.into()))
}

/// Handler replacing a user's taste vector
pub async fn replace_profile(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    AppJson(request): AppJson<ReplaceProfileRequest>,
) -> AppResult<Json<ReplaceProfileResponse>> {
    let user_id = validation::user_id(request.user_id.as_ref());
    let v = request.v.as_ref().and_then(validation::taste_vector);

    let (Some(user_id), Some(v)) = (user_id, v) else {
        return Err(AppError::validation(
            "missing_fields",
            "userId must be a string or id and v an array of 7 numbers.",
        ));
    };

    tracing::info!(request_id = %request_id, user_id = %user_id, "Replacing taste profile");

    let profile = profiles::replace_profile(state.store.as_ref(), &user_id, &v).await?;

    Ok(Json(ReplaceProfileResponse {
        ok: true,
        v: profile.v,
    }))
}
