//! Similarity engine for item-to-item comparisons
//!
//! Three independent measures, all commutative and all resolving
//! degenerate inputs to 0 instead of failing.

mod cosine;
mod matrix;
mod overlap;
mod pearson;

pub use cosine::cosine_over_ratings;
pub use matrix::ItemToItemMatrix;
pub use overlap::{overlap_coefficient, overlap_with_reference};
pub use pearson::pearson_correlation;

use crate::bail_unsupported;
use crate::error::{RecError, Result};
use crate::item::Item;
use serde::{Deserialize, Serialize};

/// Denominators below this are treated as zero
pub const EPSILON: f64 = 1e-5;

/// Rounding slack allowed at the ends of the valid range
const RANGE_SLACK: f64 = 1e-9;

/// Which measure fills the item-to-item matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityAlgorithm {
    /// Cosine over ratings of shared raters
    #[default]
    Cosine,
    /// Pearson correlation of rating vectors
    Pearson,
    /// Overlap coefficient of keyword sets
    Overlap,
}

impl std::str::FromStr for SimilarityAlgorithm {
    type Err = RecError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cosine" => Ok(SimilarityAlgorithm::Cosine),
            "pearson" => Ok(SimilarityAlgorithm::Pearson),
            "overlap" => Ok(SimilarityAlgorithm::Overlap),
            other => bail_unsupported!("similarity algorithm", other, "cosine, pearson, overlap"),
        }
    }
}

/// A similarity value known to lie in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Similarity(f64);

impl Similarity {
    pub const MIN: f64 = -1.0;
    pub const MAX: f64 = 1.0;

    /// Validate a computed value; float noise just past ±1 snaps to the bound
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() {
            return Err(RecError::SimilarityOutOfRange {
                value,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        if value > Self::MAX && value - Self::MAX <= RANGE_SLACK {
            return Ok(Similarity(Self::MAX));
        }
        if value < Self::MIN && Self::MIN - value <= RANGE_SLACK {
            return Ok(Similarity(Self::MIN));
        }
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(RecError::SimilarityOutOfRange {
                value,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(Similarity(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Similarity {
    type Error = RecError;

    fn try_from(value: f64) -> Result<Self> {
        Similarity::new(value)
    }
}

/// Similarity Engine
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityEngine {
    algorithm: SimilarityAlgorithm,
}

impl SimilarityEngine {
    pub fn new(algorithm: SimilarityAlgorithm) -> Self {
        SimilarityEngine { algorithm }
    }

    pub fn algorithm(&self) -> SimilarityAlgorithm {
        self.algorithm
    }

    /// Raw similarity of two items under the configured algorithm
    pub fn calculate_similarity(&self, a: &Item, b: &Item) -> f64 {
        match self.algorithm {
            SimilarityAlgorithm::Cosine => cosine_over_ratings(a, b),
            SimilarityAlgorithm::Pearson => pearson_correlation(a, b),
            SimilarityAlgorithm::Overlap => overlap_coefficient(a, b),
        }
    }

    /// Validated similarity of two items
    pub fn similarity(&self, a: &Item, b: &Item) -> Result<Similarity> {
        Similarity::new(self.calculate_similarity(a, b))
    }

    /// Compute every unordered pair of `items` into a fresh matrix
    ///
    /// Rows are computed on the rayon pool; the matrix is written by the
    /// calling thread only. `check` runs before each row and its first error
    /// abandons the build. A pair whose value fails validation is logged and
    /// left out.
    #[tracing::instrument(skip(self, items, check), fields(algorithm = ?self.algorithm, items = items.len()))]
    pub fn build_matrix<C>(&self, items: &[Item], check: C) -> Result<ItemToItemMatrix>
    where
        C: Fn() -> Result<()> + Sync,
    {
        use rayon::prelude::*;

        let start = std::time::Instant::now();
        let n = items.len();
        let rows: Vec<Vec<(usize, usize, f64)>> = (0..n)
            .into_par_iter()
            .map(|i| {
                check()?;
                Ok((i + 1..n)
                    .map(|j| (i, j, self.calculate_similarity(&items[i], &items[j])))
                    .collect())
            })
            .collect::<Result<_>>()?;
        let values = rows.into_iter().flatten();

        let mut matrix = ItemToItemMatrix::new();
        for (i, j, value) in values {
            if value == 0.0 {
                continue;
            }
            if let Err(e) = matrix.set(items[i].id, items[j].id, value) {
                tracing::warn!(
                    item_a = items[i].id,
                    item_b = items[j].id,
                    error = %e,
                    "Skipping invalid similarity"
                );
            }
        }

        crate::trace_time!(start, "build_matrix", pairs = matrix.len());
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests;
