use super::EPSILON;
use crate::item::Item;

/// Cosine similarity over the ratings of raters the two items share
///
/// Sums of squares cover only the shared raters. Raters are visited in user
/// id order from either side, so `cosine(a, b) == cosine(b, a)` exactly.
pub fn cosine_over_ratings(a: &Item, b: &Item) -> f64 {
    let mut numerator = 0.0;
    let mut sum_sq_a = 0.0;
    let mut sum_sq_b = 0.0;

    for rater in a.raters() {
        let Some(rating_b) = b.rating_by(&rater.user_id) else {
            continue;
        };
        numerator += rater.rating * rating_b;
        sum_sq_a += rater.rating * rater.rating;
        sum_sq_b += rating_b * rating_b;
    }

    let denominator = (sum_sq_a * sum_sq_b).sqrt();
    if denominator < EPSILON {
        return 0.0;
    }
    numerator / denominator
}
