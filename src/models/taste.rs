use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::services::vector::clamp_unit;

/// Number of flavor dimensions in every taste vector
pub const TASTE_DIMENSIONS: usize = 7;

/// Value every dimension starts at for a freshly created profile
pub const NEUTRAL_AFFINITY: f64 = 0.5;

/// A point in [0,1]^7 describing affinity per flavor dimension, ordered
/// sweet, salty, sour, bitter, umami, spicy, crunchy
///
/// Construction always clamps, so a `TasteVector` can never hold an
/// out-of-range or non-finite component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>")]
pub struct TasteVector([f64; TASTE_DIMENSIONS]);

impl TasteVector {
    pub fn new(values: [f64; TASTE_DIMENSIONS]) -> Self {
        Self(values.map(clamp_unit))
    }

    /// The starting vector for lazily created profiles
    pub fn neutral() -> Self {
        Self([NEUTRAL_AFFINITY; TASTE_DIMENSIONS])
    }

    /// Builds a vector from a slice of exactly `TASTE_DIMENSIONS` values
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        let array: [f64; TASTE_DIMENSIONS] = values.try_into().ok()?;
        Some(Self::new(array))
    }

    /// Builds a vector from a stored column, zero-filling short rows and
    /// ignoring trailing extras
    pub fn from_stored(values: &[f64]) -> Self {
        let mut array = [0.0; TASTE_DIMENSIONS];
        for (slot, value) in array.iter_mut().zip(values) {
            *slot = *value;
        }
        Self::new(array)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn values(&self) -> [f64; TASTE_DIMENSIONS] {
        self.0
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }
}

impl Default for TasteVector {
    fn default() -> Self {
        Self::neutral()
    }
}

impl TryFrom<Vec<f64>> for TasteVector {
    type Error = String;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_slice(&values).ok_or_else(|| {
            format!(
                "taste vector must have exactly {} values, got {}",
                TASTE_DIMENSIONS,
                values.len()
            )
        })
    }
}

/// Opaque user identifier handed over by the authentication layer
///
/// Positive integers are kept in canonical decimal form so `42` and `"42"`
/// address the same user. Comparison is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Normalizes a raw identifier, returning `None` when it is blank
    ///
    /// Only plain decimal integers are canonicalized, using Rust's integer
    /// parser: a leading `+` is dropped (`"+5"` is `5`) and leading zeros
    /// vanish. Exponent or fractional spellings such as `"1e3"` or `"5.0"`
    /// are kept verbatim as opaque string ids.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<u64>() {
            Ok(n) if n > 0 => Some(Self(n.to_string())),
            _ => Some(Self(trimmed.to_string())),
        }
    }

    /// Wraps an identifier read back from storage, which is already canonical
    pub fn from_stored(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's current taste vector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TasteProfile {
    pub user_id: UserId,
    pub v: TasteVector,
    pub updated_at: DateTime<Utc>,
}
