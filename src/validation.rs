//! Input contracts checked at the HTTP boundary.
//!
//! Request bodies are deserialized loosely (`serde_json::Value`) and turned
//! into domain types here, so malformed input is rejected with a tagged
//! `AppError::Validation` before any storage call is made.

use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{
        CredentialChanges, NewRecipe, RatingValue, RecipeId, RecipePatch, TasteVector,
        UserCredentials, UserId, TASTE_DIMENSIONS,
    },
    services::vector::clamp_unit,
};

/// Coerces a JSON scalar into a number, yielding NaN for anything non-numeric
fn numeric(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => f64::NAN,
    }
}

/// A strictly positive integer given as a JSON number or numeric string
pub fn positive_int(value: Option<&Value>) -> Option<i64> {
    let n = numeric(value?);
    if n.is_finite() && n.fract() == 0.0 && n >= 1.0 && n <= i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

/// A user identifier given as a positive integer or a non-blank string
pub fn user_id(value: Option<&Value>) -> Option<UserId> {
    match value? {
        Value::String(s) => UserId::parse(s),
        number @ Value::Number(_) => {
            positive_int(Some(number)).and_then(|n| UserId::parse(&n.to_string()))
        }
        _ => None,
    }
}

/// A user identifier taken from a query string or path segment
pub fn user_id_param(raw: Option<&str>) -> AppResult<UserId> {
    raw.and_then(UserId::parse).ok_or_else(|| {
        AppError::validation("userId_required", "userId must be a valid id or string.")
    })
}

/// Checks a rating already known to be a positive integer
pub fn rating_in_range(rating: i64) -> AppResult<RatingValue> {
    RatingValue::new(rating)
        .ok_or_else(|| AppError::validation("invalid_rating", "rating must be between 1 and 5."))
}

/// A taste vector of exactly seven entries; entries are coerced and clamped
pub fn taste_vector(value: &Value) -> Option<TasteVector> {
    let entries = value.as_array()?;
    if entries.len() != TASTE_DIMENSIONS {
        return None;
    }
    let values: Vec<f64> = entries.iter().map(|entry| clamp_unit(numeric(entry))).collect();
    TasteVector::from_slice(&values)
}

/// An array of strings that are each non-blank
pub fn ingredients(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|entry| match entry {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        })
        .collect()
}

/// A recipe id taken from a path segment
pub fn recipe_id_param(raw: &str) -> AppResult<RecipeId> {
    positive_int(Some(&Value::String(raw.to_string())))
        .ok_or_else(|| AppError::validation("invalid_id", "Recipe id must be a positive integer."))
}

/// Look-back window in days; non-positive or unparsable means no window
pub fn window_days(raw: Option<&str>) -> Option<u32> {
    let n = raw?.trim().parse::<f64>().ok()?;
    if n.is_finite() && n >= 1.0 {
        Some(n.floor().min(f64::from(u32::MAX)) as u32)
    } else {
        None
    }
}

fn non_empty_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Validates a full recipe for insertion
pub fn new_recipe(
    name: Option<&Value>,
    ingredient_list: Option<&Value>,
    taste_v: Option<&Value>,
    featured: Option<&Value>,
) -> AppResult<NewRecipe> {
    let name = name.and_then(non_empty_name);
    let ingredient_list = ingredient_list.and_then(ingredients);
    let taste_v = taste_v.and_then(taste_vector);

    match (name, ingredient_list, taste_v) {
        (Some(name), Some(ingredients), Some(taste_v)) => Ok(NewRecipe {
            name,
            ingredients,
            taste_v,
            featured: featured.and_then(Value::as_bool).unwrap_or(false),
        }),
        _ => Err(AppError::validation(
            "missing_fields",
            "name is required, ingredients must be an array of strings and taste_v a vector of length 7.",
        )),
    }
}

/// Validates each present field of a partial recipe update independently
pub fn recipe_patch(
    name: Option<&Value>,
    ingredient_list: Option<&Value>,
    taste_v: Option<&Value>,
    featured: Option<&Value>,
) -> AppResult<RecipePatch> {
    let mut patch = RecipePatch::default();

    if let Some(value) = name {
        patch.name = Some(non_empty_name(value).ok_or_else(|| {
            AppError::validation("invalid_name", "name must be a non-empty string.")
        })?);
    }

    if let Some(value) = ingredient_list {
        patch.ingredients = Some(ingredients(value).ok_or_else(|| {
            AppError::validation("invalid_ingredients", "ingredients must be an array of strings.")
        })?);
    }

    if let Some(value) = taste_v {
        patch.taste_v = Some(taste_vector(value).ok_or_else(|| {
            AppError::validation("invalid_taste_v", "taste_v must be a vector of length 7.")
        })?);
    }

    if let Some(value) = featured {
        patch.featured = Some(value.as_bool().ok_or_else(|| {
            AppError::validation("invalid_featured", "featured must be a boolean.")
        })?);
    }

    Ok(patch)
}

const MAX_EMAIL_LEN: usize = 255;

/// Shortest password accepted for an account
pub const MIN_PASSWORD_LEN: usize = 6;

/// An address containing `@`, lowercased
fn email(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.contains('@') && s.len() <= MAX_EMAIL_LEN => Some(s.to_lowercase()),
        _ => None,
    }
}

fn password(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.chars().count() >= MIN_PASSWORD_LEN => Some(s.clone()),
        _ => None,
    }
}

/// Validates the email and password of a new account
pub fn user_credentials(
    email_value: Option<&Value>,
    password_value: Option<&Value>,
) -> AppResult<UserCredentials> {
    match (email_value.and_then(email), password_value.and_then(password)) {
        (Some(email), Some(password)) => Ok(UserCredentials { email, password }),
        _ => Err(AppError::validation(
            "email_password_required",
            format!(
                "A valid email and a password of at least {} characters are required.",
                MIN_PASSWORD_LEN
            ),
        )),
    }
}

/// Validates each present account field independently; `null` counts as absent
pub fn credential_changes(
    email_value: Option<&Value>,
    password_value: Option<&Value>,
) -> AppResult<CredentialChanges> {
    let mut changes = CredentialChanges::default();

    if let Some(value) = email_value.filter(|v| !v.is_null()) {
        changes.email = Some(
            email(value)
                .ok_or_else(|| AppError::validation("invalid_email", "email is not valid."))?,
        );
    }

    if let Some(value) = password_value.filter(|v| !v.is_null()) {
        changes.password = Some(password(value).ok_or_else(|| {
            AppError::validation(
                "invalid_password",
                format!("password must have at least {} characters.", MIN_PASSWORD_LEN),
            )
        })?);
    }

    Ok(changes)
}
