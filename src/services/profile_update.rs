use crate::models::{RatingValue, TasteVector, TASTE_DIMENSIONS};

use super::vector::{clamp_unit, rating_to_gain};

/// Learning rate of the profile update rule
pub const ALPHA: f64 = 0.35;

/// Derives a user's next taste vector after rating a recipe
///
/// Each dimension moves by `ALPHA * gain * recipe[i]` and is clamped back
/// into [0,1]. Ratings above 3 pull toward the recipe's flavor signature,
/// ratings below push away, and a 3 leaves the profile unchanged.
pub fn update_taste_vector(
    current: &TasteVector,
    recipe: &TasteVector,
    rating: RatingValue,
) -> TasteVector {
    let gain = rating_to_gain(rating);
    let current = current.values();
    let recipe = recipe.values();

    let mut next = [0.0; TASTE_DIMENSIONS];
    for (i, slot) in next.iter_mut().enumerate() {
        *slot = clamp_unit(current[i] + ALPHA * gain * recipe[i]);
    }

    TasteVector::new(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(value: i64) -> RatingValue {
        RatingValue::new(value).unwrap()
    }

    fn assert_close(actual: &TasteVector, expected: [f64; TASTE_DIMENSIONS]) {
        for (a, e) in actual.values().iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "expected {:?}, got {:?}", expected, actual);
        }
    }

    #[test]
    fn test_top_rating_pulls_toward_recipe() {
        let profile = TasteVector::neutral();
        let recipe = TasteVector::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let next = update_taste_vector(&profile, &recipe, rating(5));
        assert_close(&next, [0.85, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_bottom_rating_pushes_away() {
        let profile = TasteVector::neutral();
        let recipe = TasteVector::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let next = update_taste_vector(&profile, &recipe, rating(1));
        assert_close(&next, [0.15, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_half_gain_ratings() {
        let profile = TasteVector::neutral();
        let recipe = TasteVector::new([0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.5]);
        let up = update_taste_vector(&profile, &recipe, rating(4));
        assert_close(&up, [0.5, 0.675, 0.5, 0.5, 0.5, 0.5, 0.5875]);
        let down = update_taste_vector(&profile, &recipe, rating(2));
        assert_close(&down, [0.5, 0.325, 0.5, 0.5, 0.5, 0.5, 0.4125]);
    }

    #[test]
    fn test_neutral_rating_is_noop() {
        let profiles = [
            TasteVector::neutral(),
            TasteVector::new([0.0, 1.0, 0.3, 0.7, 0.11, 0.99, 0.5]),
        ];
        let recipes = [
            TasteVector::new([1.0; TASTE_DIMENSIONS]),
            TasteVector::new([0.2, 0.4, 0.6, 0.8, 1.0, 0.0, 0.1]),
        ];
        for profile in &profiles {
            for recipe in &recipes {
                assert_eq!(update_taste_vector(profile, recipe, rating(3)), *profile);
            }
        }
    }

    #[test]
    fn test_update_stays_bounded() {
        let extremes = [
            TasteVector::new([0.0; TASTE_DIMENSIONS]),
            TasteVector::new([1.0; TASTE_DIMENSIONS]),
            TasteVector::new([0.9, 0.1, 0.95, 0.05, 1.0, 0.0, 0.5]),
        ];
        for profile in &extremes {
            for recipe in &extremes {
                for r in 1..=5 {
                    let next = update_taste_vector(profile, recipe, rating(r));
                    assert!(next.values().iter().all(|x| (0.0..=1.0).contains(x)));
                }
            }
        }
    }

    #[test]
    fn test_repeated_top_ratings_saturate_at_one() {
        let recipe = TasteVector::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let mut profile = TasteVector::neutral();
        for _ in 0..5 {
            profile = update_taste_vector(&profile, &recipe, rating(5));
        }
        assert_eq!(profile.values()[0], 1.0);
        assert_eq!(profile.values()[1], 0.5);
    }
}
