use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    routes::{extract::AppQuery, AppState},
    services::aggregates::{self, RatingAggregate, TasteAggregate},
    validation,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowQuery {
    pub window_days: Option<String>,
}

/// Handler for the population taste aggregate
pub async fn taste_profiles(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<WindowQuery>,
) -> AppResult<Json<TasteAggregate>> {
    let window_days = validation::window_days(query.window_days.as_deref());
    let aggregate = aggregates::taste_aggregate(state.store.as_ref(), window_days, Utc::now()).await?;
    Ok(Json(aggregate))
}

/// Handler for the global rating aggregate
pub async fn ratings(State(state): State<Arc<AppState>>) -> AppResult<Json<RatingAggregate>> {
    let aggregate = aggregates::rating_aggregate(state.store.as_ref()).await?;
    Ok(Json(aggregate))
}
