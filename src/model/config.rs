//! Model configuration parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid model or run configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("'{name}' must be finite and positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("'{name}' must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },
    #[error("Weight {index} must be finite and non-negative, got {value}")]
    InvalidWeight { index: usize, value: f64 },
    #[error("Depth list is empty")]
    EmptyDepths,
    #[error("Depth {0} m appears more than once")]
    DuplicateDepth(u32),
    #[error("Sampling stride must be at least 1")]
    ZeroStride,
}

/// How surface temperature decays with depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LapseModel {
    /// Constant latitude-dependent lapse over the whole column.
    #[default]
    Linear,
    /// Latitude-dependent lapse down to the thermocline, slower decay below it.
    Thermocline {
        /// Lapse rate below the thermocline (°C/m).
        deep_lapse_c_per_m: f64,
    },
}

/// How chlorophyll concentration varies with depth before scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChlorophyllProfile {
    /// Score the surface concentration at every depth.
    #[default]
    Surface,
    /// Subsurface chlorophyll maximum followed by exponential decay.
    SubsurfaceMaximum {
        /// Depth of the maximum (m).
        max_depth_m: f64,
        /// Fractional increase reached at the maximum.
        peak_gain: f64,
        /// Exponential decay rate below the maximum (1/m).
        decay_per_m: f64,
    },
}

impl ChlorophyllProfile {
    /// Subsurface maximum at 30 m, +30% gain, 0.015/m decay.
    pub fn subsurface_maximum() -> Self {
        Self::SubsurfaceMaximum { max_depth_m: 30.0, peak_gain: 0.3, decay_per_m: 0.015 }
    }
}

/// Parameters of the depth-adjusted Gaussian suitability score.
///
/// Units:
/// - temperatures: °C
/// - SSHA: normalized units (mean 50, spread 50)
/// - chlorophyll: mg/m³
/// - lapse rates: °C per metre
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub mu_sst: f64,
    pub sigma_sst: f64,
    pub mu_ssha: f64,
    pub sigma_ssha: f64,
    pub mu_chl: f64,
    /// Width in natural-log units.
    pub sigma_chl: f64,
    /// Relative contribution of SST, SSHA and chlorophyll.
    pub weights: [f64; 3],

    /// Adjusted SST at or below this is outside viable habitat.
    pub cold_cutoff_c: f64,
    pub lapse_base_c_per_m: f64,
    /// Added lapse at the poles, scaled by `sin(lat)^2`.
    pub lapse_amplitude_c_per_m: f64,
    /// Chlorophyll floor applied before taking the log.
    pub chl_floor: f64,

    pub lapse_model: LapseModel,
    pub chlorophyll_profile: ChlorophyllProfile,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            mu_sst: 24.0,
            sigma_sst: 2.5,
            mu_ssha: 50.0,
            sigma_ssha: 30.0,
            mu_chl: 0.5,
            sigma_chl: 0.3,
            weights: [0.4, 0.2, 0.4],

            cold_cutoff_c: 18.1,
            lapse_base_c_per_m: 0.02,
            lapse_amplitude_c_per_m: 0.01,
            chl_floor: 1e-3,

            lapse_model: LapseModel::Linear,
            chlorophyll_profile: ChlorophyllProfile::Surface,
        }
    }
}

impl ScoringConfig {
    /// Default parameters with the thermocline lapse and subsurface
    /// chlorophyll profile enabled.
    pub fn stratified() -> Self {
        Self {
            lapse_model: LapseModel::Thermocline { deep_lapse_c_per_m: 0.005 },
            chlorophyll_profile: ChlorophyllProfile::subsurface_maximum(),
            ..Default::default()
        }
    }

    /// Sum of the three mixing weights.
    pub fn weight_sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Checks that widths are positive and every parameter is finite.
    ///
    /// A weight sum above 1 is accepted; the final score is clipped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("sigma_sst", self.sigma_sst),
            ("sigma_ssha", self.sigma_ssha),
            ("sigma_chl", self.sigma_chl),
            ("mu_chl", self.mu_chl),
            ("chl_floor", self.chl_floor),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        for (name, value) in [
            ("mu_sst", self.mu_sst),
            ("mu_ssha", self.mu_ssha),
            ("cold_cutoff_c", self.cold_cutoff_c),
            ("lapse_base_c_per_m", self.lapse_base_c_per_m),
            ("lapse_amplitude_c_per_m", self.lapse_amplitude_c_per_m),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name, value });
            }
        }
        for (index, &value) in self.weights.iter().enumerate() {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidWeight { index, value });
            }
        }
        if let LapseModel::Thermocline { deep_lapse_c_per_m } = self.lapse_model {
            if !deep_lapse_c_per_m.is_finite() {
                return Err(ConfigError::NonFinite {
                    name: "deep_lapse_c_per_m",
                    value: deep_lapse_c_per_m,
                });
            }
        }
        if let ChlorophyllProfile::SubsurfaceMaximum { max_depth_m, peak_gain, decay_per_m } =
            self.chlorophyll_profile
        {
            if !(max_depth_m.is_finite() && max_depth_m > 0.0) {
                return Err(ConfigError::NonPositive { name: "max_depth_m", value: max_depth_m });
            }
            for (name, value) in [("peak_gain", peak_gain), ("decay_per_m", decay_per_m)] {
                if !value.is_finite() {
                    return Err(ConfigError::NonFinite { name, value });
                }
            }
        }
        Ok(())
    }
}

/// Parameters of the log-linear intensity link `exp(beta0 + beta1*Bp + eps)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntensityConfig {
    pub beta0: f64,
    pub beta1: f64,
    /// Standard deviation of the Gaussian jitter `eps`.
    pub noise_sd: f64,
}

impl Default for IntensityConfig {
    fn default() -> Self {
        Self { beta0: 0.0, beta1: 2.0, noise_sd: 0.05 }
    }
}

impl IntensityConfig {
    /// Same link without jitter.
    pub fn noiseless() -> Self {
        Self { noise_sd: 0.0, ..Default::default() }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("beta0", self.beta0), ("beta1", self.beta1)] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name, value });
            }
        }
        if !(self.noise_sd.is_finite() && self.noise_sd >= 0.0) {
            return Err(ConfigError::NonFinite { name: "noise_sd", value: self.noise_sd });
        }
        Ok(())
    }
}
