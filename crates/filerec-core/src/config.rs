//! Recommender configuration
//!
//! Stored as TOML, either at an explicit path or at `~/.config/filerec/config.toml`.

pub mod types;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bail_invalid;
use crate::error::{RecError, Result};

pub use types::{ExtractionConfig, RecommenderConfig, TokenizerConfig};

const CONFIG_DIR: &str = "filerec";
const CONFIG_FILE: &str = "config.toml";
const CONFIG_DIR_ENV_VAR: &str = "FILEREC_CONFIG_DIR";

impl RecommenderConfig {
    /// Default config location, honouring `FILEREC_CONFIG_DIR`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if let Ok(env_dir) = std::env::var(CONFIG_DIR_ENV_VAR) {
            PathBuf::from(env_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| RecError::Other("unable to determine config directory".to_string()))?
                .join(CONFIG_DIR)
        };

        Ok(config_dir.join(CONFIG_FILE))
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| RecError::io_operation("read config", path.display(), e))?;
        let config: RecommenderConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RecError::Other(format!("failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Check numeric fields for values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        self.hybrid_weights.validate()?;

        if !self.recommendation_threshold.is_finite() {
            bail_invalid!("recommendation_threshold", self.recommendation_threshold);
        }
        if !(self.recency_decay_days.is_finite() && self.recency_decay_days > 0.0) {
            bail_invalid!("recency_decay_days", self.recency_decay_days);
        }
        if self.max_recommendations == 0 {
            bail_invalid!("max_recommendations", self.max_recommendations);
        }
        if self.extraction.timeout_secs == 0 {
            bail_invalid!("extraction.timeout_secs", self.extraction.timeout_secs);
        }
        if self.extraction.max_workers == 0 {
            bail_invalid!("extraction.max_workers", self.extraction.max_workers);
        }
        if self.job_deadline_secs == 0 {
            bail_invalid!("job_deadline_secs", self.job_deadline_secs);
        }
        Ok(())
    }

    /// Interval between similarity recomputes, shortened in debug mode
    pub fn effective_interval(&self) -> Duration {
        if self.debug {
            Duration::from_secs(self.debug_interval_secs)
        } else {
            Duration::from_secs(self.similarity_recompute_interval_secs)
        }
    }

    pub fn job_deadline(&self) -> Duration {
        Duration::from_secs(self.job_deadline_secs)
    }
}
