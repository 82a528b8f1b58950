//! Configuration for synthetic foraging data.

use serde::{Deserialize, Serialize};

use crate::model::ConfigError;

/// A known foraging region used to seed synthetic points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub name: String,
    pub lat_center: f64,
    pub lon_center: f64,
    /// Peak intensity at the center.
    pub intensity: f64,
    /// Standard deviation of point positions in degrees.
    pub spread: f64,
}

impl Hotspot {
    pub fn new(name: &str, lat_center: f64, lon_center: f64, intensity: f64, spread: f64) -> Self {
        Self { name: name.to_string(), lat_center, lon_center, intensity, spread }
    }

    /// Major boundary currents and upwelling zones.
    pub fn ocean_defaults() -> Vec<Self> {
        vec![
            Self::new("Gulf Stream", 35.0, -70.0, 2.5, 10.0),
            Self::new("California Current", 35.0, -125.0, 2.3, 8.0),
            Self::new("Kuroshio Current", 35.0, 140.0, 2.4, 9.0),
            Self::new("Agulhas Current", -35.0, 25.0, 2.2, 8.0),
            Self::new("Peru Current", -15.0, -80.0, 2.6, 7.0),
            Self::new("Equatorial Pacific", 0.0, -140.0, 2.1, 15.0),
            Self::new("East Australian Current", -30.0, 155.0, 2.0, 8.0),
            Self::new("Canary Current", 25.0, -20.0, 1.9, 7.0),
        ]
    }
}

/// Configuration parameters for the synthetic generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub depths: Vec<u32>,
    pub hotspots: Vec<Hotspot>,
    /// Points per hotspot at the shallowest depth.
    pub points_per_hotspot: usize,
    /// Background points at the shallowest depth.
    pub background_points: usize,
    /// Fractional loss of points and intensity per depth step.
    pub depth_decay: f64,
    /// Random seed for reproducible generation. `None` draws one per run.
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            depths: vec![50, 100, 150, 200, 250, 300],
            hotspots: Hotspot::ocean_defaults(),
            points_per_hotspot: 80,
            background_points: 150,
            depth_decay: 0.12,
            seed: None,
        }
    }
}

impl SyntheticConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed), ..Default::default() }
    }

    /// Scale factor applied to point counts and intensities at depth index `i`.
    pub fn depth_factor(&self, i: usize) -> f64 {
        (1.0 - self.depth_decay * i as f64).max(0.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depths.is_empty() {
            return Err(ConfigError::EmptyDepths);
        }
        for (i, &d) in self.depths.iter().enumerate() {
            if self.depths[..i].contains(&d) {
                return Err(ConfigError::DuplicateDepth(d));
            }
        }
        if !(self.depth_decay.is_finite() && self.depth_decay >= 0.0) {
            return Err(ConfigError::NonFinite { name: "depth_decay", value: self.depth_decay });
        }
        for hs in &self.hotspots {
            if !(hs.spread.is_finite() && hs.spread > 0.0) {
                return Err(ConfigError::NonPositive { name: "hotspot spread", value: hs.spread });
            }
            for (name, value) in [
                ("hotspot lat_center", hs.lat_center),
                ("hotspot lon_center", hs.lon_center),
                ("hotspot intensity", hs.intensity),
            ] {
                if !value.is_finite() {
                    return Err(ConfigError::NonFinite { name, value });
                }
            }
        }
        Ok(())
    }
}
