use bcrypt::BcryptError;

use crate::error::{AppError, AppResult};

pub use bcrypt::DEFAULT_COST;

/// Cheapest work factor bcrypt accepts
pub const MIN_COST: u32 = 4;

/// Hashes a password with bcrypt off the async runtime
pub async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e: BcryptError| AppError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    bcrypt::verify(password, hash)
        .map_err(|e: BcryptError| AppError::Internal(format!("Failed to verify password: {}", e)))
}
