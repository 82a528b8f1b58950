//! SHARK habitat model: depth-adjusted Gaussian scoring and the
//! log-linear intensity link.
//!
//! Scoring combines three independently scaled signals (SST, SSHA and
//! chlorophyll) into a suitability `Bp` in [0, 1]; the intensity transform
//! maps `Bp` to a positive foraging intensity with multiplicative jitter.

mod config;
mod profile;
mod score;
mod intensity;

pub use config::{ChlorophyllProfile, ConfigError, IntensityConfig, LapseModel, ScoringConfig};
pub use profile::{chlorophyll_at_depth, lapse_rate, temperature_at_depth, thermocline_depth_m};
pub use score::{gaussian, score_cell, score_field, CellScore};
pub use intensity::{transform, transform_field, GaussianJitter, Jitter, NoJitter};
