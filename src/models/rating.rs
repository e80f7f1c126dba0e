use serde::Serialize;

/// Lowest accepted rating
pub const MIN_RATING: i64 = 1;
/// Highest accepted rating
pub const MAX_RATING: i64 = 5;

/// A rating on the 1..=5 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RatingValue(u8);

impl RatingValue {
    pub fn new(value: i64) -> Option<Self> {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

/// Mean and count over a set of ratings; `mean` is `None` when `count` is zero
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatingSummary {
    pub mean: Option<f64>,
    pub count: i64,
}

impl RatingSummary {
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = RatingValue>,
    {
        let (sum, count) = values
            .into_iter()
            .fold((0u64, 0i64), |(sum, count), v| (sum + u64::from(v.get()), count + 1));

        Self {
            mean: (count > 0).then(|| sum as f64 / count as f64),
            count,
        }
    }
}
