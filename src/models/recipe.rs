use serde::Serialize;

use super::TasteVector;

pub type RecipeId = i64;

/// A catalog entry scored against taste profiles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub ingredients: Vec<String>,
    pub taste_v: TasteVector,
    pub featured: bool,
}

/// Validated fields for inserting a recipe
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub name: String,
    pub ingredients: Vec<String>,
    pub taste_v: TasteVector,
    pub featured: bool,
}

impl NewRecipe {
    pub fn into_recipe(self, id: RecipeId) -> Recipe {
        Recipe {
            id,
            name: self.name,
            ingredients: self.ingredients,
            taste_v: self.taste_v,
            featured: self.featured,
        }
    }
}

/// Set of independently validated fields for a partial recipe update
///
/// Absent fields are left untouched. The whole patch is written in one
/// statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipePatch {
    pub name: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub taste_v: Option<TasteVector>,
    pub featured: Option<bool>,
}

impl RecipePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.ingredients.is_none()
            && self.taste_v.is_none()
            && self.featured.is_none()
    }

    /// Applies the present fields to an in-memory recipe
    pub fn apply(&self, recipe: &mut Recipe) {
        if let Some(name) = &self.name {
            recipe.name = name.clone();
        }
        if let Some(ingredients) = &self.ingredients {
            recipe.ingredients = ingredients.clone();
        }
        if let Some(taste_v) = self.taste_v {
            recipe.taste_v = taste_v;
        }
        if let Some(featured) = self.featured {
            recipe.featured = featured;
        }
    }
}
