//! Numeric primitives shared by the update engine, scorer and aggregates.

use crate::models::RatingValue;

/// Rating that leaves a profile unchanged
const NEUTRAL_RATING: f64 = 3.0;

/// Maps any input to the nearest value in [0,1]; non-finite input maps to 0
pub fn clamp_unit(x: f64) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}

/// Cosine similarity of two equally sized vectors
///
/// Returns 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Maps the 1..=5 rating scale onto a signed gain in [-1, 1]
pub fn rating_to_gain(rating: RatingValue) -> f64 {
    (f64::from(rating.get()) - NEUTRAL_RATING) / 2.0
}

/// Rounds to a fixed number of decimal places
pub fn round_to(x: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (x * factor).round() / factor
}
