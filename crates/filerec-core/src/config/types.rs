//! Configuration type definitions

use crate::hybrid::HybridWeights;
use crate::predict::ThresholdDirection;
use crate::rating::RatingScale;
use crate::similarity::SimilarityAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Recommender configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Use the short debug interval instead of the regular recompute interval
    #[serde(default)]
    pub debug: bool,

    /// Recompute interval while `debug` is set
    #[serde(default = "default_debug_interval_secs")]
    pub debug_interval_secs: u64,

    /// Predicted-score cutoff for including a candidate
    #[serde(default = "default_recommendation_threshold")]
    pub recommendation_threshold: f64,

    /// Which side of the threshold is included
    #[serde(default)]
    pub threshold_direction: ThresholdDirection,

    /// Interval between full similarity recomputes
    #[serde(default = "default_similarity_recompute_interval_secs")]
    pub similarity_recompute_interval_secs: u64,

    /// Algorithm used to build the item-to-item matrix
    #[serde(default)]
    pub similarity_algorithm: SimilarityAlgorithm,

    /// Blend of collaborative and content-based scores
    #[serde(default)]
    pub hybrid_weights: HybridWeights,

    /// Declared rating domain
    #[serde(default)]
    pub rating_scale: RatingScale,

    /// Days per lost rating point on the recency scale
    #[serde(default = "default_recency_decay_days")]
    pub recency_decay_days: f64,

    /// Upper bound on recommendations per user
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,

    /// Drop candidates the user already rated
    #[serde(default)]
    pub skip_rated_items: bool,

    /// Token filtering passes
    #[serde(default)]
    pub tokenizer: TokenizerConfig,

    /// Content extraction limits
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Overall deadline for one job run
    #[serde(default = "default_job_deadline_secs")]
    pub job_deadline_secs: u64,

    /// Worker threads for the similarity pass (0 = all cores)
    #[serde(default)]
    pub similarity_workers: usize,
}

/// Token filtering passes applied after tokenization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    #[serde(default = "default_true")]
    pub lowercase: bool,

    #[serde(default = "default_true")]
    pub remove_numeric: bool,

    #[serde(default = "default_true")]
    pub remove_date_like: bool,

    #[serde(default)]
    pub remove_stop_words: bool,

    #[serde(default)]
    pub stemming: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_numeric: true,
            remove_date_like: true,
            remove_stop_words: false,
            stemming: false,
        }
    }
}

/// Limits for content extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Per-file extraction timeout
    #[serde(default = "default_extraction_timeout_secs")]
    pub timeout_secs: u64,

    /// Files above this size are not read
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Archives whose declared uncompressed size exceeds this are not unpacked
    #[serde(default = "default_max_archive_entry_bytes")]
    pub max_archive_entry_bytes: u64,

    /// Root for per-file scratch directories
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,

    /// Reader threads allowed to run at once, counting ones abandoned after a timeout
    #[serde(default = "default_max_extraction_workers")]
    pub max_workers: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_extraction_timeout_secs(),
            max_file_bytes: default_max_file_bytes(),
            max_archive_entry_bytes: default_max_archive_entry_bytes(),
            scratch_dir: None,
            max_workers: default_max_extraction_workers(),
        }
    }
}

impl ExtractionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Scratch root, defaulting to `<tmp>/filerec`
    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("filerec"))
    }
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            debug: false,
            debug_interval_secs: default_debug_interval_secs(),
            recommendation_threshold: default_recommendation_threshold(),
            threshold_direction: ThresholdDirection::default(),
            similarity_recompute_interval_secs: default_similarity_recompute_interval_secs(),
            similarity_algorithm: SimilarityAlgorithm::default(),
            hybrid_weights: HybridWeights::default(),
            rating_scale: RatingScale::default(),
            recency_decay_days: default_recency_decay_days(),
            max_recommendations: default_max_recommendations(),
            skip_rated_items: false,
            tokenizer: TokenizerConfig::default(),
            extraction: ExtractionConfig::default(),
            job_deadline_secs: default_job_deadline_secs(),
            similarity_workers: 0,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_debug_interval_secs() -> u64 {
    60
}

fn default_recommendation_threshold() -> f64 {
    2.5
}

fn default_similarity_recompute_interval_secs() -> u64 {
    86_400
}

fn default_recency_decay_days() -> f64 {
    7.0
}

fn default_max_recommendations() -> usize {
    20
}

fn default_extraction_timeout_secs() -> u64 {
    30
}

fn default_max_extraction_workers() -> usize {
    4
}

fn default_max_file_bytes() -> u64 {
    64 * 1024 * 1024
}

fn default_max_archive_entry_bytes() -> u64 {
    256 * 1024 * 1024
}

fn default_job_deadline_secs() -> u64 {
    3_600
}
