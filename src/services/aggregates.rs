use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;

use crate::{db::TasteStore, error::AppResult, models::TASTE_DIMENSIONS};

use super::vector::{clamp_unit, round_to};

/// Population mean taste vector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TasteAggregate {
    pub average: Vec<f64>,
    pub count: usize,
    pub window_days: Option<u32>,
}

/// Global mean rating
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingAggregate {
    pub average_rating: Option<f64>,
    pub rating_count: i64,
}

/// Start of a calendar-day window ending today
///
/// A window of 1 starts at today's midnight (UTC), a window of 7 at the
/// midnight six days earlier. Returns `None` when the window reaches back
/// past the Unix epoch, which no stored profile predates, so every profile
/// qualifies.
pub fn window_start(now: DateTime<Utc>, window_days: u32) -> Option<DateTime<Utc>> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let look_back = Duration::try_days(i64::from(window_days.max(1)) - 1)?;
    midnight
        .checked_sub_signed(look_back)
        .filter(|start| *start >= DateTime::UNIX_EPOCH)
}

/// Component-wise mean over vectors of possibly different lengths
///
/// Each index is averaged over the vectors that have it. With no vectors the
/// result is a zero vector of the standard dimensionality.
pub fn mean_vector(vectors: &[Vec<f64>]) -> Vec<f64> {
    let dims = vectors.iter().map(Vec::len).max().unwrap_or(0);
    if dims == 0 {
        return vec![0.0; TASTE_DIMENSIONS];
    }

    let mut sums = vec![0.0; dims];
    let mut counts = vec![0usize; dims];
    for vector in vectors {
        for (i, value) in vector.iter().enumerate() {
            sums[i] += value;
            counts[i] += 1;
        }
    }

    sums.iter()
        .zip(&counts)
        .map(|(sum, count)| clamp_unit(sum / *count as f64))
        .collect()
}

/// Mean taste vector over all profiles, optionally restricted to a window
pub async fn taste_aggregate(
    store: &dyn TasteStore,
    window_days: Option<u32>,
    now: DateTime<Utc>,
) -> AppResult<TasteAggregate> {
    let since = window_days.and_then(|days| window_start(now, days));
    let vectors = store.profile_vectors(since).await?;

    tracing::debug!(
        window_days = ?window_days,
        since = ?since,
        profiles = vectors.len(),
        "Aggregating taste profiles"
    );

    Ok(TasteAggregate {
        average: mean_vector(&vectors),
        count: vectors.len(),
        window_days,
    })
}

/// Mean and count over every rating
pub async fn rating_aggregate(store: &dyn TasteStore) -> AppResult<RatingAggregate> {
    let summary = store.rating_summary().await?;

    Ok(RatingAggregate {
        average_rating: summary.mean.map(|mean| round_to(mean, 2)),
        rating_count: summary.count,
    })
}
