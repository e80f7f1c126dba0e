use serde::Serialize;
use std::collections::HashMap;

use crate::{
    db::TasteStore,
    error::{AppError, AppResult, Resource},
    models::{RatingSummary, RatingValue, Recipe, RecipeId, TasteVector, UserId},
};

use super::vector::{cosine_similarity, round_to};

/// Weight of taste affinity in the blended score
pub const TASTE_WEIGHT: f64 = 0.75;
/// Weight of the ingredient match ratio in the blended score
pub const MATCH_WEIGHT: f64 = 0.25;
/// Additive boost for curated recipes, applied after blending
pub const FEATURED_BOOST: f64 = 0.05;

/// Lower-cased, trimmed ingredient search terms
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchTerms(Vec<String>);

impl SearchTerms {
    /// Parses a comma-separated query, dropping empty terms
    pub fn parse(query: Option<&str>) -> Self {
        let terms = query
            .map(|q| {
                q.split(',')
                    .map(|term| term.trim().to_lowercase())
                    .filter(|term| !term.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self(terms)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Number of terms contained in at least one of the ingredients
    pub fn matched_count(&self, ingredients: &[String]) -> usize {
        let lowered: Vec<String> = ingredients.iter().map(|i| i.to_lowercase()).collect();
        self.0
            .iter()
            .filter(|term| lowered.iter().any(|ingredient| ingredient.contains(term.as_str())))
            .count()
    }
}

/// Display hint explaining why a recipe is listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationReason {
    /// Curated by the restaurant
    Featured,
    /// Ranked on flavor affinity alone
    TasteMatch,
}

/// Relevance figures duplicated for the restaurant dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestaurantMetrics {
    pub relevance: f64,
    pub match_percentage: i64,
    pub acceptance_score: Option<f64>,
}

/// One ranked recipe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecipe {
    pub id: RecipeId,
    pub name: String,
    pub score: f64,
    pub reason: RecommendationReason,
    pub featured: bool,
    pub ingredients: Vec<String>,
    pub taste_v: TasteVector,
    pub match_percentage: i64,
    pub avg_rating: Option<f64>,
    pub user_rating: Option<RatingValue>,
    pub acceptance_score: Option<f64>,
    pub restaurant_metrics: RestaurantMetrics,
}

/// Weighted blend of taste affinity and ingredient match
pub fn blend(taste_score: f64, match_ratio: f64) -> f64 {
    TASTE_WEIGHT * taste_score + MATCH_WEIGHT * match_ratio
}

/// Scores one recipe, or `None` when search terms were given and none match
pub fn score_recipe(
    recipe: &Recipe,
    user_v: &TasteVector,
    terms: &SearchTerms,
    stats: Option<&RatingSummary>,
    user_rating: Option<RatingValue>,
) -> Option<ScoredRecipe> {
    let matched = if terms.is_empty() {
        0
    } else {
        terms.matched_count(&recipe.ingredients)
    };
    if !terms.is_empty() && matched == 0 {
        return None;
    }

    let taste_score = cosine_similarity(recipe.taste_v.as_slice(), user_v.as_slice());
    let match_ratio = if terms.is_empty() {
        0.0
    } else {
        matched as f64 / terms.len() as f64
    };

    let base = blend(taste_score, match_ratio);
    let boost = if recipe.featured { FEATURED_BOOST } else { 0.0 };
    let score = round_to(base + boost, 3);
    let match_percentage = (base * 100.0).round() as i64;

    let avg_rating = stats.and_then(|s| s.mean).map(|mean| round_to(mean, 2));
    let acceptance_score = avg_rating.map(|avg| round_to(avg / 5.0, 3));

    let reason = if recipe.featured {
        RecommendationReason::Featured
    } else {
        RecommendationReason::TasteMatch
    };

    Some(ScoredRecipe {
        id: recipe.id,
        name: recipe.name.clone(),
        score,
        reason,
        featured: recipe.featured,
        ingredients: recipe.ingredients.clone(),
        taste_v: recipe.taste_v,
        match_percentage,
        avg_rating,
        user_rating,
        acceptance_score,
        restaurant_metrics: RestaurantMetrics {
            relevance: score,
            match_percentage,
            acceptance_score,
        },
    })
}

/// Scores the catalog and sorts it by descending score
///
/// The sort is stable, so equal scores keep catalog order.
pub fn rank_recipes(
    user_v: &TasteVector,
    catalog: &[Recipe],
    terms: &SearchTerms,
    stats: &HashMap<RecipeId, RatingSummary>,
    user_ratings: &HashMap<RecipeId, RatingValue>,
) -> Vec<ScoredRecipe> {
    let mut scored: Vec<ScoredRecipe> = catalog
        .iter()
        .filter_map(|recipe| {
            score_recipe(
                recipe,
                user_v,
                terms,
                stats.get(&recipe.id),
                user_ratings.get(&recipe.id).copied(),
            )
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

/// Ranks the catalog for a user's stored taste profile
pub async fn recommend(
    store: &dyn TasteStore,
    user_id: &UserId,
    query: Option<&str>,
) -> AppResult<Vec<ScoredRecipe>> {
    let profile = store
        .get_profile(user_id)
        .await?
        .ok_or(AppError::NotFound(Resource::Profile))?;

    let catalog = store.list_recipes().await?;
    let stats = store.recipe_rating_stats().await?;
    let user_ratings = store.user_ratings(user_id).await?;
    let terms = SearchTerms::parse(query);

    let ranked = rank_recipes(&profile.v, &catalog, &terms, &stats, &user_ratings);

    tracing::debug!(
        user_id = %user_id,
        catalog_size = catalog.len(),
        term_count = terms.len(),
        returned = ranked.len(),
        "Recipes ranked"
    );

    Ok(ranked)
}
