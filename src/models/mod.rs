mod rating;
mod recipe;
mod taste;
mod user;

pub use rating::{RatingSummary, RatingValue, MAX_RATING, MIN_RATING};
pub use recipe::{NewRecipe, Recipe, RecipeId, RecipePatch};
pub use taste::{
    TasteProfile, TasteVector, UserId, NEUTRAL_AFFINITY, TASTE_DIMENSIONS,
};
pub use user::{CredentialChanges, NewUser, Role, User, UserCredentials, UserPatch};
