use crate::{
    db::TasteStore,
    error::{AppError, AppResult, Resource},
    models::{TasteProfile, TasteVector, UserId},
};

/// Fetches a user's profile
pub async fn get_profile(store: &dyn TasteStore, user_id: &UserId) -> AppResult<TasteProfile> {
    store
        .get_profile(user_id)
        .await?
        .ok_or(AppError::NotFound(Resource::Profile))
}

/// Returns the user's profile, creating a neutral one on first access
pub async fn ensure_profile(store: &dyn TasteStore, user_id: &UserId) -> AppResult<TasteProfile> {
    if let Some(profile) = store.get_profile(user_id).await? {
        return Ok(profile);
    }

    let profile = store
        .insert_profile_if_absent(user_id, &TasteVector::neutral())
        .await?;

    tracing::info!(user_id = %user_id, "Created neutral taste profile");

    Ok(profile)
}

/// Overwrites (or creates) the user's profile with an explicit vector
pub async fn replace_profile(
    store: &dyn TasteStore,
    user_id: &UserId,
    v: &TasteVector,
) -> AppResult<TasteProfile> {
    let profile = store.upsert_profile(user_id, v).await?;

    tracing::info!(user_id = %user_id, v = ?profile.v.as_slice(), "Taste profile replaced");

    Ok(profile)
}
