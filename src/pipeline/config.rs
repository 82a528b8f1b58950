//! Run configuration for the multi-depth driver.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ConfigError, IntensityConfig, ScoringConfig};

/// Errors that can occur while reading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a multi-depth run needs besides the input fields.
///
/// Loaded from JSON with every field optional; missing fields take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Depth levels in metres, processed independently.
    pub depths: Vec<u32>,
    /// Every `stride`-th row and column is emitted as an output point.
    pub stride: usize,
    /// Base seed for the intensity jitter. `None` draws a fresh seed per run.
    pub seed: Option<u64>,
    /// Emit cells below the cold cutoff as points instead of excluding them.
    pub emit_cold_suppressed: bool,
    pub scoring: ScoringConfig,
    pub intensity: IntensityConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            depths: vec![50, 100, 150, 200, 250, 300],
            stride: 5,
            seed: None,
            emit_cold_suppressed: false,
            scoring: ScoringConfig::default(),
            intensity: IntensityConfig::default(),
        }
    }
}

impl RunConfig {
    /// Default configuration with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed), ..Default::default() }
    }

    /// Parses a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigLoadError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a configuration file. The result is not validated.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Seed used for the jitter of one depth pass.
    pub fn depth_seed(base: u64, depth_m: u32) -> u64 {
        base.wrapping_add(depth_m as u64)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depths.is_empty() {
            return Err(ConfigError::EmptyDepths);
        }
        let mut seen = BTreeSet::new();
        for &d in &self.depths {
            if !seen.insert(d) {
                return Err(ConfigError::DuplicateDepth(d));
            }
        }
        if self.stride == 0 {
            return Err(ConfigError::ZeroStride);
        }
        self.scoring.validate()?;
        self.intensity.validate()
    }
}
