use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::TasteVector,
    routes::{extract::AppJson, AppState},
    services::ratings,
    validation,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRatingRequest {
    pub user_id: Option<Value>,
    pub recipe_id: Option<Value>,
    pub rating: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct SubmitRatingResponse {
    pub ok: bool,
    pub v: TasteVector,
}

/// Handler for rating submission with taste-profile update
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    AppJson(request): AppJson<SubmitRatingRequest>,
) -> AppResult<Json<SubmitRatingResponse>> {
    let user_id = validation::user_id(request.user_id.as_ref());
    let recipe_id = validation::positive_int(request.recipe_id.as_ref());
    let rating = validation::positive_int(request.rating.as_ref());

    let (Some(user_id), Some(recipe_id), Some(rating)) = (user_id, recipe_id, rating) else {
        return Err(AppError::validation(
            "missing_fields",
            "userId, recipeId (integer) and rating are required.",
        ));
    };
    let rating = validation::rating_in_range(rating)?;

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        recipe_id = recipe_id,
        "Processing rating submission"
    );

    let v = ratings::submit_rating(state.store.as_ref(), &user_id, recipe_id, rating).await?;

    Ok(Json(SubmitRatingResponse { ok: true, v }))
}
