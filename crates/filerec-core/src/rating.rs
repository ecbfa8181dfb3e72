//! Rating domains and rating derivation from user interaction signals
//!
//! Ratings come in two encodings: a binary favorite flag (0/1) and a
//! recency-decay score (0..5). Every consumer takes the scale explicitly.

use crate::error::{RecError, Result};
use crate::item::ItemId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declared rating domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingScale {
    /// 0 = not favorite, 1 = favorite
    Binary,
    /// 0..5, decaying with time since last change
    #[default]
    Recency,
}

impl RatingScale {
    pub fn min(self) -> f64 {
        0.0
    }

    pub fn max(self) -> f64 {
        match self {
            RatingScale::Binary => 1.0,
            RatingScale::Recency => 5.0,
        }
    }

    /// Accept a rating only if it lies on this scale
    pub fn validate(self, value: f64) -> Result<f64> {
        if value.is_finite() && value >= self.min() && value <= self.max() {
            Ok(value)
        } else {
            Err(RecError::RatingOutOfRange {
                value,
                min: self.min(),
                max: self.max(),
            })
        }
    }

    /// Map a value on this scale into [0, 1]
    ///
    /// Predictions can leave the scale when negative similarities are
    /// involved, so the result is clamped.
    pub fn normalize(self, value: f64) -> f64 {
        let span = self.max() - self.min();
        ((value - self.min()) / span).clamp(0.0, 1.0)
    }
}

/// Rating for the binary favorite encoding
pub fn favorite_rating(is_favorite: bool) -> f64 {
    if is_favorite {
        1.0
    } else {
        0.0
    }
}

/// Rating for the recency encoding: 5 on the day of the change, one point
/// lost per `decay_days`, never below 0
pub fn recency_rating(last_changed: DateTime<Utc>, now: DateTime<Utc>, decay_days: f64) -> f64 {
    let max = RatingScale::Recency.max();
    if decay_days <= 0.0 {
        return max;
    }
    let age_days = (now - last_changed).num_seconds().max(0) as f64 / 86_400.0;
    (max - age_days / decay_days).clamp(0.0, max)
}

/// One user-item interaction as reported by the host platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: String,
    pub item_id: ItemId,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub last_changed: Option<DateTime<Utc>>,
}

impl Interaction {
    /// Derive the rating on `scale`
    ///
    /// On the recency scale an interaction without a change timestamp
    /// rates 0.
    pub fn rating(&self, scale: RatingScale, now: DateTime<Utc>, decay_days: f64) -> f64 {
        match scale {
            RatingScale::Binary => favorite_rating(self.favorite),
            RatingScale::Recency => self
                .last_changed
                .map(|changed| recency_rating(changed, now, decay_days))
                .unwrap_or(0.0),
        }
    }
}

/// An already-computed rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingTuple {
    pub user_id: String,
    pub item_id: ItemId,
    pub rating: f64,
}

/// Source of per-user ratings
pub trait RatingSource {
    fn ratings(&self) -> Result<Vec<RatingTuple>>;
}

impl RatingSource for Vec<RatingTuple> {
    fn ratings(&self) -> Result<Vec<RatingTuple>> {
        Ok(self.clone())
    }
}

/// Ratings derived from interaction signals on a fixed scale
pub struct InteractionRatings<'a> {
    pub interactions: &'a [Interaction],
    pub scale: RatingScale,
    pub now: DateTime<Utc>,
    pub decay_days: f64,
}

impl RatingSource for InteractionRatings<'_> {
    fn ratings(&self) -> Result<Vec<RatingTuple>> {
        Ok(self
            .interactions
            .iter()
            .map(|i| RatingTuple {
                user_id: i.user_id.clone(),
                item_id: i.item_id,
                rating: i.rating(self.scale, self.now, self.decay_days),
            })
            .collect())
    }
}
