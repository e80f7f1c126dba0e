use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::{
    error::AppResult,
    models::{
        NewRecipe, NewUser, RatingSummary, RatingValue, Recipe, RecipeId, RecipePatch,
        TasteProfile, TasteVector, User, UserId, UserPatch,
    },
};

/// Persistence collaborator for profiles, the recipe catalog and ratings
///
/// Every call is one round trip to the backing store. Implementations must
/// make each method atomic: a method either applies all of its writes or
/// none of them.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TasteStore: Send + Sync {
    /// Checks that the backing store is reachable
    async fn ping(&self) -> AppResult<()>;

    async fn get_profile(&self, user_id: &UserId) -> AppResult<Option<TasteProfile>>;

    /// Inserts `v` for the user unless a profile already exists; returns the stored profile
    async fn insert_profile_if_absent(
        &self,
        user_id: &UserId,
        v: &TasteVector,
    ) -> AppResult<TasteProfile>;

    /// Creates or overwrites the user's profile
    async fn upsert_profile(&self, user_id: &UserId, v: &TasteVector) -> AppResult<TasteProfile>;

    /// Raw stored vectors of every profile updated at or after `since`
    async fn profile_vectors(&self, since: Option<DateTime<Utc>>) -> AppResult<Vec<Vec<f64>>>;

    /// Whole catalog ordered by id
    async fn list_recipes(&self) -> AppResult<Vec<Recipe>>;

    async fn get_recipe(&self, id: RecipeId) -> AppResult<Option<Recipe>>;

    async fn insert_recipe(&self, recipe: &NewRecipe) -> AppResult<Recipe>;

    /// Applies a non-empty patch; `None` when the recipe does not exist
    async fn update_recipe(&self, id: RecipeId, patch: &RecipePatch) -> AppResult<Option<Recipe>>;

    /// Deletes a recipe together with its ratings; `false` when it does not exist
    async fn delete_recipe(&self, id: RecipeId) -> AppResult<bool>;

    /// Inserts or overwrites the (user, recipe) rating
    async fn upsert_rating(
        &self,
        user_id: &UserId,
        recipe_id: RecipeId,
        rating: RatingValue,
    ) -> AppResult<()>;

    /// Upserts the rating and overwrites the user's profile vector in one unit
    ///
    /// Fails with `NotFound(Profile)` if the profile vanished in the meantime.
    async fn apply_rating(
        &self,
        user_id: &UserId,
        recipe_id: RecipeId,
        rating: RatingValue,
        v: &TasteVector,
    ) -> AppResult<TasteProfile>;

    /// Per-recipe rating summaries for every recipe with at least one rating
    async fn recipe_rating_stats(&self) -> AppResult<HashMap<RecipeId, RatingSummary>>;

    async fn rating_stats_for(&self, recipe_id: RecipeId) -> AppResult<RatingSummary>;

    /// The user's own rating per recipe
    async fn user_ratings(&self, user_id: &UserId) -> AppResult<HashMap<RecipeId, RatingValue>>;

    /// Mean and count over every stored rating
    async fn rating_summary(&self) -> AppResult<RatingSummary>;

    /// Plain (non-privileged) users, newest first
    async fn list_users(&self) -> AppResult<Vec<User>>;

    async fn get_user(&self, user_id: &UserId) -> AppResult<Option<User>>;

    /// Creates a plain `user` account; a taken email is `Conflict("email_exists")`
    async fn insert_user(&self, user: &NewUser) -> AppResult<User>;

    /// Overwrites fields of a plain account; `None` when no such plain account exists
    async fn update_user(&self, user_id: &UserId, patch: &UserPatch) -> AppResult<Option<User>>;

    /// Removes a plain user with their ratings and profile in one unit
    ///
    /// Fails with `NotFound(User)` or `Forbidden` for protected accounts.
    async fn delete_user(&self, user_id: &UserId) -> AppResult<()>;
}
