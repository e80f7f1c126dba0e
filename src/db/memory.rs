use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult, Resource},
    models::{
        NewRecipe, NewUser, RatingSummary, RatingValue, Recipe, RecipeId, RecipePatch, Role,
        TasteProfile, TasteVector, User, UserId, UserPatch,
    },
};

use super::TasteStore;

#[derive(Debug, Clone)]
struct StoredRating {
    value: RatingValue,
    updated_at: DateTime<Utc>,
}

/// In-process `TasteStore`
///
/// Each trait method runs under a single lock acquisition, which makes
/// multi-step mutations all-or-nothing.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    profiles: HashMap<UserId, TasteProfile>,
    recipes: BTreeMap<RecipeId, Recipe>,
    ratings: HashMap<(UserId, RecipeId), StoredRating>,
    users: HashMap<UserId, User>,
    password_hashes: HashMap<UserId, String>,
    last_recipe_id: RecipeId,
    last_user_id: u64,
}

impl MemoryStoreInner {
    fn email_taken(&self, email: &str, except: Option<&UserId>) -> bool {
        self.users
            .values()
            .any(|user| user.email == email && Some(&user.id) != except)
    }

    fn next_user_id(&mut self) -> UserId {
        loop {
            self.last_user_id += 1;
            let id = UserId::from_stored(self.last_user_id.to_string());
            if !self.users.contains_key(&id) {
                return id;
            }
        }
    }

    fn summary_where<F>(&self, predicate: F) -> RatingSummary
    where
        F: Fn(&(UserId, RecipeId)) -> bool,
    {
        RatingSummary::from_values(
            self.ratings
                .iter()
                .filter(|(key, _)| predicate(*key))
                .map(|(_, rating)| rating.value),
        )
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account, as the authentication layer would
    pub async fn add_user(&self, user: User) {
        let mut inner = self.inner.write().await;
        inner.users.insert(user.id.clone(), user);
    }

    /// Stored password hash of an account created through `insert_user`
    pub async fn password_hash(&self, user_id: &UserId) -> Option<String> {
        self.inner.read().await.password_hashes.get(user_id).cloned()
    }

    /// Number of stored rating rows
    pub async fn rating_count(&self) -> usize {
        self.inner.read().await.ratings.len()
    }

    /// Last time the (user, recipe) rating was written
    pub async fn rating_updated_at(
        &self,
        user_id: &UserId,
        recipe_id: RecipeId,
    ) -> Option<DateTime<Utc>> {
        let inner = self.inner.read().await;
        inner
            .ratings
            .get(&(user_id.clone(), recipe_id))
            .map(|rating| rating.updated_at)
    }
}

#[async_trait]
impl TasteStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn get_profile(&self, user_id: &UserId) -> AppResult<Option<TasteProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.profiles.get(user_id).cloned())
    }

    async fn insert_profile_if_absent(
        &self,
        user_id: &UserId,
        v: &TasteVector,
    ) -> AppResult<TasteProfile> {
        let mut inner = self.inner.write().await;
        let profile = inner
            .profiles
            .entry(user_id.clone())
            .or_insert_with(|| TasteProfile {
                user_id: user_id.clone(),
                v: *v,
                updated_at: Utc::now(),
            });
        Ok(profile.clone())
    }

    async fn upsert_profile(&self, user_id: &UserId, v: &TasteVector) -> AppResult<TasteProfile> {
        let mut inner = self.inner.write().await;
        let profile = TasteProfile {
            user_id: user_id.clone(),
            v: *v,
            updated_at: Utc::now(),
        };
        inner.profiles.insert(user_id.clone(), profile.clone());
        Ok(profile)
    }

    async fn profile_vectors(&self, since: Option<DateTime<Utc>>) -> AppResult<Vec<Vec<f64>>> {
        let inner = self.inner.read().await;
        Ok(inner
            .profiles
            .values()
            .filter(|profile| since.map_or(true, |cutoff| profile.updated_at >= cutoff))
            .map(|profile| profile.v.to_vec())
            .collect())
    }

    async fn list_recipes(&self) -> AppResult<Vec<Recipe>> {
        let inner = self.inner.read().await;
        Ok(inner.recipes.values().cloned().collect())
    }

    async fn get_recipe(&self, id: RecipeId) -> AppResult<Option<Recipe>> {
        let inner = self.inner.read().await;
        Ok(inner.recipes.get(&id).cloned())
    }

    async fn insert_recipe(&self, recipe: &NewRecipe) -> AppResult<Recipe> {
        let mut inner = self.inner.write().await;
        inner.last_recipe_id += 1;
        let stored = recipe.clone().into_recipe(inner.last_recipe_id);
        inner.recipes.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_recipe(&self, id: RecipeId, patch: &RecipePatch) -> AppResult<Option<Recipe>> {
        let mut inner = self.inner.write().await;
        Ok(inner.recipes.get_mut(&id).map(|recipe| {
            patch.apply(recipe);
            recipe.clone()
        }))
    }

    async fn delete_recipe(&self, id: RecipeId) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.recipes.remove(&id).is_none() {
            return Ok(false);
        }
        inner.ratings.retain(|(_, recipe_id), _| *recipe_id != id);
        Ok(true)
    }

    async fn upsert_rating(
        &self,
        user_id: &UserId,
        recipe_id: RecipeId,
        rating: RatingValue,
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.recipes.contains_key(&recipe_id) {
            return Err(AppError::NotFound(Resource::Recipe));
        }
        inner.ratings.insert(
            (user_id.clone(), recipe_id),
            StoredRating {
                value: rating,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn apply_rating(
        &self,
        user_id: &UserId,
        recipe_id: RecipeId,
        rating: RatingValue,
        v: &TasteVector,
    ) -> AppResult<TasteProfile> {
        let mut inner = self.inner.write().await;
        if !inner.recipes.contains_key(&recipe_id) {
            return Err(AppError::NotFound(Resource::Recipe));
        }
        let now = Utc::now();
        let profile = match inner.profiles.get_mut(user_id) {
            Some(profile) => {
                profile.v = *v;
                profile.updated_at = now;
                profile.clone()
            }
            None => return Err(AppError::NotFound(Resource::Profile)),
        };
        inner.ratings.insert(
            (user_id.clone(), recipe_id),
            StoredRating {
                value: rating,
                updated_at: now,
            },
        );
        Ok(profile)
    }

    async fn recipe_rating_stats(&self) -> AppResult<HashMap<RecipeId, RatingSummary>> {
        let inner = self.inner.read().await;
        let mut grouped: HashMap<RecipeId, Vec<RatingValue>> = HashMap::new();
        for ((_, recipe_id), rating) in &inner.ratings {
            grouped.entry(*recipe_id).or_default().push(rating.value);
        }
        Ok(grouped
            .into_iter()
            .map(|(recipe_id, values)| (recipe_id, RatingSummary::from_values(values)))
            .collect())
    }

    async fn rating_stats_for(&self, recipe_id: RecipeId) -> AppResult<RatingSummary> {
        let inner = self.inner.read().await;
        Ok(inner.summary_where(|(_, id)| *id == recipe_id))
    }

    async fn user_ratings(&self, user_id: &UserId) -> AppResult<HashMap<RecipeId, RatingValue>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .iter()
            .filter(|((owner, _), _)| owner == user_id)
            .map(|((_, recipe_id), rating)| (*recipe_id, rating.value))
            .collect())
    }

    async fn rating_summary(&self) -> AppResult<RatingSummary> {
        let inner = self.inner.read().await;
        Ok(inner.summary_where(|_| true))
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner
            .users
            .values()
            .filter(|user| !user.role.is_protected())
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn delete_user(&self, user_id: &UserId) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get(user_id)
            .ok_or(AppError::NotFound(Resource::User))?;

        if user.role.is_protected() {
            return Err(AppError::Forbidden(
                "Privileged accounts cannot be deleted".to_string(),
            ));
        }

        inner.ratings.retain(|(owner, _), _| owner != user_id);
        inner.profiles.remove(user_id);
        inner.password_hashes.remove(user_id);
        inner.users.remove(user_id);
        Ok(())
    }

    async fn get_user(&self, user_id: &UserId) -> AppResult<Option<User>> {
        Ok(self.inner.read().await.users.get(user_id).cloned())
    }

    async fn insert_user(&self, user: &NewUser) -> AppResult<User> {
        let mut inner = self.inner.write().await;
        if inner.email_taken(&user.email, None) {
            return Err(AppError::conflict(
                "email_exists",
                "An account with this email already exists",
            ));
        }

        let created = User {
            id: inner.next_user_id(),
            email: user.email.clone(),
            role: Role::User,
            created_at: Utc::now(),
        };
        inner
            .password_hashes
            .insert(created.id.clone(), user.password_hash.clone());
        inner.users.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn update_user(&self, user_id: &UserId, patch: &UserPatch) -> AppResult<Option<User>> {
        let mut inner = self.inner.write().await;
        let is_plain = inner
            .users
            .get(user_id)
            .is_some_and(|user| !user.role.is_protected());
        if !is_plain {
            return Ok(None);
        }
        if let Some(email) = &patch.email {
            if inner.email_taken(email, Some(user_id)) {
                return Err(AppError::conflict(
                    "email_exists",
                    "An account with this email already exists",
                ));
            }
        }

        if let Some(password_hash) = &patch.password_hash {
            inner
                .password_hashes
                .insert(user_id.clone(), password_hash.clone());
        }
        let Some(user) = inner.users.get_mut(user_id) else {
            return Ok(None);
        };
        if let Some(email) = &patch.email {
            user.email = email.clone();
        }
        Ok(Some(user.clone()))
    }
}
