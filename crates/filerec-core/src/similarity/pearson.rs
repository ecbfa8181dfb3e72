use crate::item::Item;
use std::collections::BTreeSet;

/// Pearson correlation of two items' rating vectors
///
/// Each mean is taken over the item's own raters. Deviations are summed over
/// the union of both rater sets; a user missing from one item counts as a
/// 0 ("no like") rating there. Returns 0 when either variance is 0.
pub fn pearson_correlation(a: &Item, b: &Item) -> f64 {
    let users: BTreeSet<&str> = a
        .raters()
        .chain(b.raters())
        .map(|r| r.user_id.as_str())
        .collect();
    if users.is_empty() {
        return 0.0;
    }

    let mean_a = a.mean_rating();
    let mean_b = b.mean_rating();

    let mut covariance = 0.0;
    let mut variance_a = 0.0;
    let mut variance_b = 0.0;

    for user in users {
        let dev_a = a.rating_by(user).unwrap_or(0.0) - mean_a;
        let dev_b = b.rating_by(user).unwrap_or(0.0) - mean_b;
        covariance += dev_a * dev_b;
        variance_a += dev_a * dev_a;
        variance_b += dev_b * dev_b;
    }

    let denominator = (variance_a * variance_b).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    covariance / denominator
}
