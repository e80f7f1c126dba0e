use crate::{
    db::TasteStore,
    error::{AppError, AppResult, Resource},
    models::{NewRecipe, Recipe, RecipeId, RecipePatch},
};

pub async fn list_recipes(store: &dyn TasteStore) -> AppResult<Vec<Recipe>> {
    store.list_recipes().await
}

pub async fn get_recipe(store: &dyn TasteStore, id: RecipeId) -> AppResult<Recipe> {
    store
        .get_recipe(id)
        .await?
        .ok_or(AppError::NotFound(Resource::Recipe))
}

pub async fn create_recipe(store: &dyn TasteStore, recipe: NewRecipe) -> AppResult<Recipe> {
    let created = store.insert_recipe(&recipe).await?;

    tracing::info!(
        recipe_id = created.id,
        name = %created.name,
        featured = created.featured,
        "Recipe created"
    );

    Ok(created)
}

/// Applies a partial update in one write
pub async fn update_recipe(
    store: &dyn TasteStore,
    id: RecipeId,
    patch: RecipePatch,
) -> AppResult<Recipe> {
    if patch.is_empty() {
        return Err(AppError::validation("nothing_to_update", "Nothing to update."));
    }

    let updated = store
        .update_recipe(id, &patch)
        .await?
        .ok_or(AppError::NotFound(Resource::Recipe))?;

    tracing::info!(recipe_id = id, "Recipe updated");

    Ok(updated)
}

/// Deletes a recipe and every rating referencing it
pub async fn delete_recipe(store: &dyn TasteStore, id: RecipeId) -> AppResult<()> {
    if !store.delete_recipe(id).await? {
        return Err(AppError::NotFound(Resource::Recipe));
    }

    tracing::info!(recipe_id = id, "Recipe deleted");

    Ok(())
}
