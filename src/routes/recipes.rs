use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    routes::{
        extract::{AppJson, AppQuery},
        AppState,
    },
    services::{
        ratings::{self, RecipeRatingOutcome},
        recommendations::{self, ScoredRecipe},
    },
    validation,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationQuery {
    pub user_id: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRecipeRequest {
    pub user_id: Option<Value>,
    pub rating: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct RateRecipeResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub outcome: RecipeRatingOutcome,
}

/// Handler for ranked recipe recommendations
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    AppQuery(query): AppQuery<RecommendationQuery>,
) -> AppResult<Json<Vec<ScoredRecipe>>> {
    let user_id = validation::user_id_param(query.user_id.as_deref())?;

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        query = ?query.q,
        "Processing recommendation request"
    );

    let ranked =
        recommendations::recommend(state.store.as_ref(), &user_id, query.q.as_deref()).await?;

    Ok(Json(ranked))
}

/// Handler rating a single recipe; does not touch the taste profile
pub async fn rate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(request): AppJson<RateRecipeRequest>,
) -> AppResult<Json<RateRecipeResponse>> {
    let recipe_id = validation::recipe_id_param(&id)?;
    let user_id = validation::user_id(request.user_id.as_ref());
    let rating = validation::positive_int(request.rating.as_ref());

    let (Some(user_id), Some(rating)) = (user_id, rating) else {
        return Err(AppError::validation(
            "missing_fields",
            "userId (string or id) and rating (integer) are required.",
        ));
    };
    let rating = validation::rating_in_range(rating)?;

    let outcome = ratings::rate_recipe(state.store.as_ref(), recipe_id, &user_id, rating).await?;

    Ok(Json(RateRecipeResponse { ok: true, outcome }))
}
