//! Per-repository configuration loaded from `.faultline.toml`.
//!
//! Every key is optional; command-line flags take precedence over file
//! values. Weight triples are validated at this boundary and never silently
//! renormalized.

use std::path::Path;

use serde::Deserialize;

use crate::core::errors::{Error, Result};
use crate::core::repository::FixPattern;
use crate::core::types::FeatureWeights;

pub const CONFIG_FILE: &str = ".faultline.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaultlineConfig {
    /// Maximum number of commits, since the most recent, to analyze
    pub commits: Option<usize>,
    /// Regex of paths to ignore
    pub ignore: Option<String>,
    /// Custom bug-fixing keyword pattern (case-insensitive)
    pub fix_pattern: Option<String>,
    /// Decay curve shaping in [0, 1]
    pub time_range: Option<f64>,
    pub weights: Option<WeightsConfig>,
    pub learning: Option<LearningConfig>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightsConfig {
    pub revisions: f64,
    pub fixes: f64,
    pub authors: f64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LearningConfig {
    pub bits: Option<u32>,
    pub generations: Option<u32>,
}

impl FaultlineConfig {
    /// Load the configuration from the analyzed repository's root; a missing
    /// file yields the defaults
    pub fn load(repo_path: &Path) -> Result<Self> {
        let config_path = repo_path.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&contents).map_err(|e| {
            Error::configuration(format!("errors in {}: {e}", config_path.display()))
        })?;
        log::debug!("loaded config from {}", config_path.display());
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.feature_weights()?;
        self.fix_pattern()?;
        self.time_range()?;
        Ok(())
    }

    /// The configured weights, validated, or the defaults
    pub fn feature_weights(&self) -> Result<FeatureWeights> {
        match self.weights {
            Some(w) => {
                let weights = FeatureWeights::new(w.revisions, w.fixes, w.authors);
                weights.validate()?;
                Ok(weights)
            }
            None => Ok(FeatureWeights::default()),
        }
    }

    pub fn fix_pattern(&self) -> Result<FixPattern> {
        match &self.fix_pattern {
            Some(pattern) => FixPattern::new(pattern),
            None => Ok(FixPattern::default()),
        }
    }

    pub fn time_range(&self) -> Result<f64> {
        match self.time_range {
            Some(range) if (0.0..=1.0).contains(&range) => Ok(range),
            Some(range) => Err(Error::configuration(format!(
                "time_range must be within [0, 1], got {range}"
            ))),
            None => Ok(crate::analytics::risk::DEFAULT_TIME_RANGE),
        }
    }

    pub fn learning(&self) -> LearningConfig {
        self.learning.unwrap_or_default()
    }
}
