use super::*;
use crate::item::{Item, Rater};
use crate::keywords::{Keyword, KeywordList};
use crate::rating::RatingScale;

fn rated(id: u64, ratings: &[(&str, f64)]) -> Item {
    let mut item = Item::new(id, format!("file-{id}"));
    for (user, rating) in ratings {
        item.add_rater(Rater::new(*user, *rating, RatingScale::Recency).unwrap());
    }
    item
}

fn with_keywords(id: u64, words: &[&str]) -> Item {
    let keywords: KeywordList = words.iter().map(|w| Keyword::new(*w, 1.0)).collect();
    Item::new(id, format!("file-{id}")).with_keywords(keywords)
}

#[test]
fn test_cosine_identical_rating_vectors() {
    let a = rated(1, &[("u1", 5.0), ("u2", 3.0)]);
    let b = rated(2, &[("u1", 5.0), ("u2", 3.0)]);
    assert_eq!(cosine_over_ratings(&a, &b), 1.0);
}

#[test]
fn test_cosine_self_similarity() {
    let a = rated(1, &[("u1", 2.5), ("u2", 4.0), ("u3", 1.0)]);
    assert!((cosine_over_ratings(&a, &a) - 1.0).abs() < 1e-12);

    let single = rated(2, &[("u1", 3.0)]);
    assert_eq!(cosine_over_ratings(&single, &single), 1.0);
}

#[test]
fn test_cosine_self_similarity_without_nonzero_ratings() {
    let zeros = rated(1, &[("u1", 0.0), ("u2", 0.0)]);
    assert_eq!(cosine_over_ratings(&zeros, &zeros), 0.0);

    let unrated = Item::new(2, "empty");
    assert_eq!(cosine_over_ratings(&unrated, &unrated), 0.0);
}

#[test]
fn test_cosine_only_counts_shared_raters() {
    // u3 only rates b and must not affect the norm of b
    let a = rated(1, &[("u1", 4.0), ("u2", 2.0)]);
    let b = rated(2, &[("u1", 2.0), ("u2", 1.0), ("u3", 5.0)]);
    assert!((cosine_over_ratings(&a, &b) - 1.0).abs() < 1e-12);
}

#[test]
fn test_cosine_no_shared_raters() {
    let a = rated(1, &[("u1", 4.0)]);
    let b = rated(2, &[("u2", 4.0)]);
    assert_eq!(cosine_over_ratings(&a, &b), 0.0);
}

#[test]
fn test_cosine_symmetry() {
    let a = rated(1, &[("u1", 1.0), ("u2", 4.5), ("u3", 2.0), ("u5", 0.5)]);
    let b = rated(2, &[("u3", 3.0), ("u1", 0.7), ("u2", 1.1), ("u4", 5.0)]);
    assert_eq!(cosine_over_ratings(&a, &b), cosine_over_ratings(&b, &a));
}

#[test]
fn test_pearson_perfect_correlation() {
    let a = rated(1, &[("u1", 1.0), ("u2", 2.0), ("u3", 3.0)]);
    let b = rated(2, &[("u1", 1.5), ("u2", 3.0), ("u3", 4.5)]);
    assert!((pearson_correlation(&a, &b) - 1.0).abs() < 1e-12);
}

#[test]
fn test_pearson_inverse_correlation() {
    let a = rated(1, &[("u1", 1.0), ("u2", 3.0)]);
    let b = rated(2, &[("u1", 3.0), ("u2", 1.0)]);
    assert!((pearson_correlation(&a, &b) + 1.0).abs() < 1e-12);
}

#[test]
fn test_pearson_zero_variance_is_zero() {
    let flat = rated(1, &[("u1", 3.0), ("u2", 3.0)]);
    let other = rated(2, &[("u1", 1.0), ("u2", 5.0)]);
    assert_eq!(pearson_correlation(&flat, &other), 0.0);
}

#[test]
fn test_pearson_empty_items() {
    let a = Item::new(1, "a");
    let b = Item::new(2, "b");
    assert_eq!(pearson_correlation(&a, &b), 0.0);
}

#[test]
fn test_pearson_symmetry_with_disjoint_raters() {
    let a = rated(1, &[("u1", 5.0), ("u2", 1.0), ("u3", 4.0)]);
    let b = rated(2, &[("u2", 2.0), ("u4", 5.0), ("u1", 3.5)]);
    assert_eq!(pearson_correlation(&a, &b), pearson_correlation(&b, &a));
    let value = pearson_correlation(&a, &b);
    assert!((-1.0..=1.0).contains(&value));
}

#[test]
fn test_overlap_scenario() {
    let a = with_keywords(1, &["cat", "dog"]);
    let b = with_keywords(2, &["cat", "bird"]);
    assert_eq!(overlap_coefficient(&a, &b), 0.5);
}

#[test]
fn test_overlap_uses_smaller_set() {
    let a = with_keywords(1, &["cat"]);
    let b = with_keywords(2, &["cat", "dog", "bird"]);
    assert_eq!(overlap_coefficient(&a, &b), 1.0);
    assert_eq!(overlap_coefficient(&b, &a), 1.0);
}

#[test]
fn test_overlap_empty_and_disjoint() {
    let a = with_keywords(1, &["cat"]);
    let unprocessed = Item::new(2, "b");
    let disjoint = with_keywords(3, &["fish"]);
    assert_eq!(overlap_coefficient(&a, &unprocessed), 0.0);
    assert_eq!(overlap_coefficient(&a, &disjoint), 0.0);
}

#[test]
fn test_overlap_with_reference_deduplicates() {
    let score = overlap_with_reference(["cat", "cat", "dog"], ["cat", "cat"]);
    assert_eq!(score, 1.0);
}

#[test]
fn test_similarity_snaps_rounding_noise() {
    assert_eq!(Similarity::new(1.0 + 1e-12).unwrap().value(), 1.0);
    assert_eq!(Similarity::new(-1.0 - 1e-12).unwrap().value(), -1.0);
    assert!(Similarity::new(1.01).is_err());
    assert!(Similarity::new(f64::NAN).is_err());
    assert!(Similarity::try_from(0.3).is_ok());
}

#[test]
fn test_algorithm_from_str() {
    assert_eq!(
        "pearson".parse::<SimilarityAlgorithm>().unwrap(),
        SimilarityAlgorithm::Pearson
    );
    assert!(matches!(
        "jaccard".parse::<SimilarityAlgorithm>(),
        Err(RecError::Unsupported { .. })
    ));
}

#[test]
fn test_engine_dispatches_by_algorithm() {
    let a = rated(1, &[("u1", 5.0), ("u2", 3.0)]).with_keywords(
        ["cat", "dog"].iter().map(|w| Keyword::new(*w, 1.0)).collect(),
    );
    let b = rated(2, &[("u1", 5.0), ("u2", 3.0)]).with_keywords(
        ["cat", "bird"].iter().map(|w| Keyword::new(*w, 1.0)).collect(),
    );

    assert_eq!(
        SimilarityEngine::new(SimilarityAlgorithm::Cosine).calculate_similarity(&a, &b),
        1.0
    );
    assert_eq!(
        SimilarityEngine::new(SimilarityAlgorithm::Overlap)
            .similarity(&a, &b)
            .unwrap()
            .value(),
        0.5
    );
}

#[test]
fn test_build_matrix_covers_all_pairs() {
    let items = vec![
        rated(1, &[("u1", 5.0), ("u2", 3.0)]),
        rated(2, &[("u1", 5.0), ("u2", 3.0)]),
        rated(3, &[("u3", 2.0)]),
    ];
    let matrix = SimilarityEngine::new(SimilarityAlgorithm::Cosine)
        .build_matrix(&items, || Ok(()))
        .unwrap();

    assert_eq!(matrix.get(1, 2), 1.0);
    assert_eq!(matrix.get(2, 1), 1.0);
    // No shared raters: nothing stored, reads as 0
    assert!(!matrix.contains(1, 3));
    assert_eq!(matrix.get(3, 2), 0.0);
    assert_eq!(matrix.len(), 1);
}

#[test]
fn test_build_matrix_is_deterministic() {
    let items: Vec<Item> = (1..=12)
        .map(|id| {
            rated(
                id,
                &[("u1", (id % 5) as f64), ("u2", ((id * 3) % 5) as f64), ("u3", 2.0)],
            )
        })
        .collect();
    let engine = SimilarityEngine::new(SimilarityAlgorithm::Pearson);
    assert_eq!(
        engine.build_matrix(&items, || Ok(())).unwrap(),
        engine.build_matrix(&items, || Ok(())).unwrap()
    );
}

#[test]
fn test_build_matrix_stops_when_check_fails() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let items: Vec<Item> = (1..=8).map(|id| rated(id, &[("u1", 3.0)])).collect();
    let rows = AtomicUsize::new(0);
    let result = SimilarityEngine::new(SimilarityAlgorithm::Cosine).build_matrix(&items, || {
        if rows.fetch_add(1, Ordering::SeqCst) >= 2 {
            Err(RecError::Interrupted)
        } else {
            Ok(())
        }
    });

    assert!(matches!(result, Err(RecError::Interrupted)));
}
