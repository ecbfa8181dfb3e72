//! Weighted blending of collaborative and content-based scores

use crate::bail_unsupported;
use crate::error::{RecError, Result};
use crate::item::ItemId;
use serde::{Deserialize, Serialize};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Fixed blend weights; must sum to 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HybridWeights {
    pub collaborative: f64,
    pub content_based: f64,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self::BALANCED
    }
}

impl HybridWeights {
    /// Equal weighting
    pub const BALANCED: HybridWeights = HybridWeights {
        collaborative: 0.5,
        content_based: 0.5,
    };

    /// Content-dominated weighting
    pub const CONTENT_HEAVY: HybridWeights = HybridWeights {
        collaborative: 0.1,
        content_based: 0.9,
    };

    /// Validated weights
    pub fn new(collaborative: f64, content_based: f64) -> Result<Self> {
        let weights = HybridWeights {
            collaborative,
            content_based,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Look up a named preset
    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "balanced" => Ok(Self::BALANCED),
            "content_heavy" => Ok(Self::CONTENT_HEAVY),
            other => bail_unsupported!("hybrid weight preset", other, "balanced, content_heavy"),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let both_valid = [self.collaborative, self.content_based]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0);
        let sum = self.collaborative + self.content_based;
        if !both_valid || (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(RecError::invalid_value(
                "hybrid weights",
                format!("{} + {}", self.collaborative, self.content_based),
            ));
        }
        Ok(())
    }

    /// Weighted sum of the two scores
    pub fn combine(&self, collaborative: f64, content_based: f64) -> f64 {
        self.collaborative * collaborative + self.content_based * content_based
    }
}

/// Which score of a [`HybridItem`] a caller asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HybridType {
    Collaborative,
    ContentBased,
    Hybrid,
}

impl std::str::FromStr for HybridType {
    type Err = RecError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "collaborative" => Ok(HybridType::Collaborative),
            "content_based" | "content" => Ok(HybridType::ContentBased),
            "hybrid" => Ok(HybridType::Hybrid),
            other => Err(RecError::UnsupportedHybridType(other.to_string())),
        }
    }
}

/// Both scores of one (item, user) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridItem {
    pub item_id: ItemId,
    pub user_id: String,
    pub collaborative: f64,
    pub content_based: f64,
}

impl HybridItem {
    pub fn score(&self, kind: HybridType, weights: &HybridWeights) -> f64 {
        match kind {
            HybridType::Collaborative => self.collaborative,
            HybridType::ContentBased => self.content_based,
            HybridType::Hybrid => weights.combine(self.collaborative, self.content_based),
        }
    }

    /// Score selected by a textual type tag
    pub fn score_for_tag(&self, tag: &str, weights: &HybridWeights) -> Result<f64> {
        let kind: HybridType = tag.parse()?;
        Ok(self.score(kind, weights))
    }
}
