//! Rating prediction from the item-to-item matrix
//!
//! For a target user, every item i receives
//! `sum(sim(i, j) * rating(j)) / sum(sim(i, j))` over the items j the user
//! rated with a non-zero similarity to i. Items whose denominator is
//! (numerically) zero get no prediction.

mod rank;

pub use rank::{RankedItem, Ranker};

use crate::item::{Item, ItemId};
use crate::similarity::{ItemToItemMatrix, EPSILON};
use serde::{Deserialize, Serialize};

/// Which side of the threshold a predicted score must fall on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdDirection {
    /// Include when predicted score > threshold
    #[default]
    Above,
    /// Include when predicted score < threshold (legacy comparison)
    Below,
}

impl ThresholdDirection {
    pub fn accepts(self, score: f64, threshold: f64) -> bool {
        match self {
            ThresholdDirection::Above => score > threshold,
            ThresholdDirection::Below => score < threshold,
        }
    }
}

/// One predicted candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub item_id: ItemId,
    pub score: f64,
}

/// Predicted recommendations for one user
///
/// Candidates are kept in the order they were predicted, which is the order
/// of the item corpus handed to [`RatingPredictor::predict`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recommendation {
    pub user_id: String,
    pub items: Vec<Prediction>,
}

impl Recommendation {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, prediction: Prediction) {
        self.items.push(prediction);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|p| p.item_id).collect()
    }
}

/// Predicts ratings for unrated candidates and applies the threshold gate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingPredictor {
    pub threshold: f64,
    pub direction: ThresholdDirection,
    pub skip_rated_items: bool,
}

impl RatingPredictor {
    pub fn new(threshold: f64, direction: ThresholdDirection) -> Self {
        Self {
            threshold,
            direction,
            skip_rated_items: false,
        }
    }

    pub fn skip_rated_items(mut self, skip: bool) -> Self {
        self.skip_rated_items = skip;
        self
    }

    /// Predicted score of `candidate` for `user_id`, if any
    pub fn predict_item(
        &self,
        candidate: &Item,
        items: &[Item],
        matrix: &ItemToItemMatrix,
        user_id: &str,
    ) -> Option<f64> {
        let mut numerator = 0.0;
        let mut denominator = 0.0;

        for other in items {
            if other.id == candidate.id {
                continue;
            }
            let similarity = matrix.get(candidate.id, other.id);
            if similarity == 0.0 {
                continue;
            }
            let Some(rating) = other.rating_by(user_id) else {
                continue;
            };
            numerator += similarity * rating;
            denominator += similarity;
        }

        if denominator.abs() < EPSILON {
            return None;
        }
        Some(numerator / denominator)
    }

    /// Build the gated candidate list for one user
    pub fn predict(
        &self,
        items: &[Item],
        matrix: &ItemToItemMatrix,
        user_id: &str,
    ) -> Recommendation {
        let mut recommendation = Recommendation::new(user_id);

        for candidate in items {
            if self.skip_rated_items && candidate.rating_by(user_id).is_some() {
                continue;
            }
            let Some(score) = self.predict_item(candidate, items, matrix, user_id) else {
                continue;
            };
            if self.direction.accepts(score, self.threshold) {
                recommendation.push(Prediction {
                    item_id: candidate.id,
                    score,
                });
            }
        }

        tracing::debug!(
            user_id,
            candidates = recommendation.len(),
            "Predicted recommendations"
        );
        recommendation
    }
}
