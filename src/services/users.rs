use crate::{
    db::TasteStore,
    error::{AppError, AppResult, Resource},
    models::{CredentialChanges, NewUser, User, UserCredentials, UserId, UserPatch},
};

use super::passwords::hash_password;

/// Plain user accounts, newest first
pub async fn list_users(store: &dyn TasteStore) -> AppResult<Vec<User>> {
    store.list_users().await
}

/// Creates a plain account with a bcrypt-hashed password
pub async fn create_user(
    store: &dyn TasteStore,
    credentials: UserCredentials,
    password_cost: u32,
) -> AppResult<User> {
    let password_hash = hash_password(credentials.password, password_cost).await?;
    let user = store
        .insert_user(&NewUser {
            email: credentials.email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User created");

    Ok(user)
}

/// Changes the email and/or password of a plain account
///
/// Checks run in this order: unknown id, privileged account, empty change set.
pub async fn update_user(
    store: &dyn TasteStore,
    user_id: &UserId,
    changes: CredentialChanges,
    password_cost: u32,
) -> AppResult<User> {
    let current = store
        .get_user(user_id)
        .await?
        .ok_or(AppError::NotFound(Resource::User))?;

    if current.role.is_protected() {
        return Err(AppError::Forbidden(
            "Privileged accounts cannot be edited".to_string(),
        ));
    }

    if changes.is_empty() {
        return Err(AppError::validation(
            "nothing_to_update",
            "Provide an email or a password to update.",
        ));
    }

    let password_hash = match changes.password {
        Some(password) => Some(hash_password(password, password_cost).await?),
        None => None,
    };
    let patch = UserPatch {
        email: changes.email,
        password_hash,
    };

    let updated = store
        .update_user(user_id, &patch)
        .await?
        .ok_or(AppError::NotFound(Resource::User))?;

    tracing::info!(
        user_id = %user_id,
        email_changed = patch.email.is_some(),
        password_changed = patch.password_hash.is_some(),
        "User updated"
    );

    Ok(updated)
}

/// Deletes a plain user together with their ratings and taste profile
pub async fn delete_user(store: &dyn TasteStore, user_id: &UserId) -> AppResult<()> {
    store.delete_user(user_id).await?;

    tracing::info!(user_id = %user_id, "User deleted with ratings and profile");

    Ok(())
}
