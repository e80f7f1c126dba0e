use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult, Resource},
    models::{
        NewRecipe, NewUser, RatingSummary, RatingValue, Recipe, RecipeId, RecipePatch, Role,
        TasteProfile, TasteVector, User, UserId, UserPatch,
    },
};

use super::TasteStore;

const RECIPE_COLUMNS: &str = "id, name, ingredients, taste_v, featured";

const USER_COLUMNS: &str = "id, email, role, created_at";

/// Inserts a profile or returns the existing one
///
/// The no-op `DO UPDATE` locks a concurrently committed row and returns it,
/// so the statement yields a row even when another session won the insert.
const ENSURE_PROFILE_SQL: &str = r#"
    INSERT INTO taste_profiles (user_id, v)
    VALUES ($1, $2)
    ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
    RETURNING user_id, v, updated_at
"#;

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    user_id: String,
    v: Vec<f64>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for TasteProfile {
    fn from(row: ProfileRow) -> Self {
        TasteProfile {
            user_id: UserId::from_stored(row.user_id),
            v: TasteVector::from_stored(&row.v),
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RecipeRow {
    id: i64,
    name: String,
    ingredients: Vec<String>,
    taste_v: Vec<f64>,
    featured: bool,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        Recipe {
            id: row.id,
            name: row.name,
            ingredients: row.ingredients,
            taste_v: TasteVector::from_stored(&row.taste_v),
            featured: row.featured,
        }
    }
}

#[derive(Debug, FromRow)]
struct RatingStatsRow {
    recipe_id: i64,
    avg_rating: Option<f64>,
    rating_count: i64,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_stored(row.id),
            email: row.email,
            role: Role::from_db(&row.role),
            created_at: row.created_at,
        }
    }
}

fn rating_column(rating: RatingValue) -> i16 {
    i16::from(rating.get())
}

/// Maps a unique violation on `users.email` to a caller-visible conflict
fn email_conflict(err: sqlx::Error) -> AppError {
    let unique_violation = err
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);

    if unique_violation {
        AppError::conflict("email_exists", "An account with this email already exists")
    } else {
        AppError::Database(err)
    }
}

/// `TasteStore` backed by PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TasteStore for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_profile(&self, user_id: &UserId) -> AppResult<Option<TasteProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT user_id, v, updated_at FROM taste_profiles WHERE user_id = $1",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TasteProfile::from))
    }

    async fn insert_profile_if_absent(
        &self,
        user_id: &UserId,
        v: &TasteVector,
    ) -> AppResult<TasteProfile> {
        let row = sqlx::query_as::<_, ProfileRow>(ENSURE_PROFILE_SQL)
            .bind(user_id.as_str())
            .bind(v.as_slice())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn upsert_profile(&self, user_id: &UserId, v: &TasteVector) -> AppResult<TasteProfile> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO taste_profiles (user_id, v)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET v = EXCLUDED.v, updated_at = now()
            RETURNING user_id, v, updated_at
            "#,
        )
        .bind(user_id.as_str())
        .bind(v.as_slice())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn profile_vectors(&self, since: Option<DateTime<Utc>>) -> AppResult<Vec<Vec<f64>>> {
        let vectors = sqlx::query_scalar::<_, Vec<f64>>(
            r#"
            SELECT v FROM taste_profiles
            WHERE $1::timestamptz IS NULL OR updated_at >= $1
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(vectors)
    }

    async fn list_recipes(&self) -> AppResult<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {} FROM recipes ORDER BY id ASC",
            RECIPE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn get_recipe(&self, id: RecipeId) -> AppResult<Option<Recipe>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {} FROM recipes WHERE id = $1",
            RECIPE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Recipe::from))
    }

    async fn insert_recipe(&self, recipe: &NewRecipe) -> AppResult<Recipe> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            INSERT INTO recipes (name, ingredients, taste_v, featured)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            RECIPE_COLUMNS
        ))
        .bind(&recipe.name)
        .bind(&recipe.ingredients)
        .bind(recipe.taste_v.as_slice())
        .bind(recipe.featured)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_recipe(&self, id: RecipeId, patch: &RecipePatch) -> AppResult<Option<Recipe>> {
        if patch.is_empty() {
            return self.get_recipe(id).await;
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE recipes SET ");
        {
            let mut fields = builder.separated(", ");
            if let Some(name) = &patch.name {
                fields.push("name = ").push_bind_unseparated(name.clone());
            }
            if let Some(ingredients) = &patch.ingredients {
                fields
                    .push("ingredients = ")
                    .push_bind_unseparated(ingredients.clone());
            }
            if let Some(taste_v) = &patch.taste_v {
                fields
                    .push("taste_v = ")
                    .push_bind_unseparated(taste_v.to_vec());
            }
            if let Some(featured) = patch.featured {
                fields.push("featured = ").push_bind_unseparated(featured);
            }
        }
        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(RECIPE_COLUMNS);

        let row = builder
            .build_query_as::<RecipeRow>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Recipe::from))
    }

    async fn delete_recipe(&self, id: RecipeId) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let ratings = sqlx::query("DELETE FROM recipe_ratings WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;

        tracing::debug!(
            recipe_id = id,
            ratings_removed = ratings.rows_affected(),
            "Recipe deleted"
        );

        Ok(true)
    }

    async fn upsert_rating(
        &self,
        user_id: &UserId,
        recipe_id: RecipeId,
        rating: RatingValue,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO recipe_ratings (user_id, recipe_id, rating)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, recipe_id)
            DO UPDATE SET rating = EXCLUDED.rating, updated_at = now()
            "#,
        )
        .bind(user_id.as_str())
        .bind(recipe_id)
        .bind(rating_column(rating))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn apply_rating(
        &self,
        user_id: &UserId,
        recipe_id: RecipeId,
        rating: RatingValue,
        v: &TasteVector,
    ) -> AppResult<TasteProfile> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO recipe_ratings (user_id, recipe_id, rating)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, recipe_id)
            DO UPDATE SET rating = EXCLUDED.rating, updated_at = now()
            "#,
        )
        .bind(user_id.as_str())
        .bind(recipe_id)
        .bind(rating_column(rating))
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            UPDATE taste_profiles SET v = $2, updated_at = now()
            WHERE user_id = $1
            RETURNING user_id, v, updated_at
            "#,
        )
        .bind(user_id.as_str())
        .bind(v.as_slice())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Err(AppError::NotFound(Resource::Profile));
        };

        tx.commit().await?;

        Ok(row.into())
    }

    async fn recipe_rating_stats(&self) -> AppResult<HashMap<RecipeId, RatingSummary>> {
        let rows = sqlx::query_as::<_, RatingStatsRow>(
            r#"
            SELECT recipe_id, avg(rating)::float8 AS avg_rating, count(*) AS rating_count
            FROM recipe_ratings
            GROUP BY recipe_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.recipe_id,
                    RatingSummary {
                        mean: row.avg_rating,
                        count: row.rating_count,
                    },
                )
            })
            .collect())
    }

    async fn rating_stats_for(&self, recipe_id: RecipeId) -> AppResult<RatingSummary> {
        let (mean, count) = sqlx::query_as::<_, (Option<f64>, i64)>(
            r#"
            SELECT avg(rating)::float8, count(*)
            FROM recipe_ratings
            WHERE recipe_id = $1
            "#,
        )
        .bind(recipe_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(RatingSummary { mean, count })
    }

    async fn user_ratings(&self, user_id: &UserId) -> AppResult<HashMap<RecipeId, RatingValue>> {
        let rows = sqlx::query_as::<_, (i64, i16)>(
            "SELECT recipe_id, rating FROM recipe_ratings WHERE user_id = $1",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(recipe_id, rating)| {
                RatingValue::new(i64::from(rating)).map(|value| (recipe_id, value))
            })
            .collect())
    }

    async fn rating_summary(&self) -> AppResult<RatingSummary> {
        let (mean, count) = sqlx::query_as::<_, (Option<f64>, i64)>(
            "SELECT avg(rating)::float8, count(*) FROM recipe_ratings",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(RatingSummary { mean, count })
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE role = 'user' ORDER BY created_at DESC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn get_user(&self, user_id: &UserId) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn insert_user(&self, user: &NewUser) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (email, password_hash, role) VALUES ($1, $2, 'user') RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(email_conflict)?;

        Ok(row.into())
    }

    async fn update_user(&self, user_id: &UserId, patch: &UserPatch) -> AppResult<Option<User>> {
        if patch.is_empty() {
            return Ok(self
                .get_user(user_id)
                .await?
                .filter(|user| !user.role.is_protected()));
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE users SET ");
        {
            let mut fields = builder.separated(", ");
            if let Some(email) = &patch.email {
                fields.push("email = ").push_bind_unseparated(email.clone());
            }
            if let Some(password_hash) = &patch.password_hash {
                fields
                    .push("password_hash = ")
                    .push_bind_unseparated(password_hash.clone());
            }
        }
        builder
            .push(" WHERE id = ")
            .push_bind(user_id.as_str().to_string())
            .push(" AND role = 'user' RETURNING ")
            .push(USER_COLUMNS);

        let row = builder
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(email_conflict)?;

        Ok(row.map(User::from))
    }

    async fn delete_user(&self, user_id: &UserId) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let role = sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(role) = role else {
            tx.rollback().await?;
            return Err(AppError::NotFound(Resource::User));
        };

        if Role::from_db(&role).is_protected() {
            tx.rollback().await?;
            return Err(AppError::Forbidden(
                "Privileged accounts cannot be deleted".to_string(),
            ));
        }

        sqlx::query("DELETE FROM recipe_ratings WHERE user_id = $1")
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM taste_profiles WHERE user_id = $1")
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = $1 AND role = 'user'")
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
