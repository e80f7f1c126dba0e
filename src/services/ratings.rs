//! The two rating entry points.
//!
//! `submit_rating` records the rating *and* moves the user's taste profile.
//! `rate_recipe` only records the rating and reports the recipe's new
//! aggregate; it never touches the profile. Callers rely on that difference.

use serde::Serialize;

use crate::{
    db::TasteStore,
    error::{AppError, AppResult, Resource},
    models::{RatingValue, RecipeId, TasteVector, UserId},
};

use super::{profile_update::update_taste_vector, vector::round_to};

/// Aggregate returned after rating a single recipe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeRatingOutcome {
    pub recipe_id: RecipeId,
    pub user_rating: RatingValue,
    pub avg_rating: Option<f64>,
    pub rating_count: i64,
    pub acceptance_score: Option<f64>,
}

/// Records a rating and applies the profile update rule
///
/// Both the profile and the recipe must exist before anything is written.
/// The read-compute-write sequence is not isolated from concurrent ratings
/// by the same user; the last write wins.
pub async fn submit_rating(
    store: &dyn TasteStore,
    user_id: &UserId,
    recipe_id: RecipeId,
    rating: RatingValue,
) -> AppResult<TasteVector> {
    let profile = store
        .get_profile(user_id)
        .await?
        .ok_or(AppError::NotFound(Resource::Profile))?;

    let recipe = store
        .get_recipe(recipe_id)
        .await?
        .ok_or(AppError::NotFound(Resource::Recipe))?;

    let next = update_taste_vector(&profile.v, &recipe.taste_v, rating);
    let stored = store.apply_rating(user_id, recipe_id, rating, &next).await?;

    tracing::info!(
        user_id = %user_id,
        recipe_id = recipe_id,
        rating = rating.get(),
        "Rating applied to taste profile"
    );

    Ok(stored.v)
}

/// Records a rating for one recipe without updating the taste profile
pub async fn rate_recipe(
    store: &dyn TasteStore,
    recipe_id: RecipeId,
    user_id: &UserId,
    rating: RatingValue,
) -> AppResult<RecipeRatingOutcome> {
    if store.get_recipe(recipe_id).await?.is_none() {
        return Err(AppError::NotFound(Resource::Recipe));
    }

    store.upsert_rating(user_id, recipe_id, rating).await?;
    let summary = store.rating_stats_for(recipe_id).await?;

    tracing::info!(
        user_id = %user_id,
        recipe_id = recipe_id,
        rating = rating.get(),
        rating_count = summary.count,
        "Recipe rated"
    );

    Ok(RecipeRatingOutcome {
        recipe_id,
        user_rating: rating,
        avg_rating: summary.mean.map(|mean| round_to(mean, 2)),
        rating_count: summary.count,
        acceptance_score: summary.mean.map(|mean| round_to(mean / 5.0, 3)),
    })
}
