//! Vertical temperature and chlorophyll profiles.

use super::config::{ChlorophyllProfile, LapseModel, ScoringConfig};

/// Latitude-dependent temperature lapse rate (°C per metre).
///
/// `base + amplitude * sin(lat)^2`, i.e. 0.02–0.03 °C/m with the defaults.
/// Stands in for the variation in mixed-layer stratification with latitude.
pub fn lapse_rate(latitude_deg: f64, cfg: &ScoringConfig) -> f64 {
    let s = latitude_deg.to_radians().sin();
    cfg.lapse_base_c_per_m + cfg.lapse_amplitude_c_per_m * s * s
}

/// Approximate thermocline depth (m): 150 m at the equator, shoaling by
/// 0.5 m per degree of latitude.
pub fn thermocline_depth_m(latitude_deg: f64) -> f64 {
    150.0 - latitude_deg.abs() * 0.5
}

/// Temperature at `depth_m` given the surface value.
pub fn temperature_at_depth(sst_c: f64, latitude_deg: f64, depth_m: f64, cfg: &ScoringConfig) -> f64 {
    let lapse = lapse_rate(latitude_deg, cfg);
    match cfg.lapse_model {
        LapseModel::Linear => sst_c - lapse * depth_m,
        LapseModel::Thermocline { deep_lapse_c_per_m } => {
            let tcd = thermocline_depth_m(latitude_deg);
            if depth_m <= tcd {
                sst_c - lapse * depth_m
            } else {
                sst_c - lapse * tcd - deep_lapse_c_per_m * (depth_m - tcd)
            }
        }
    }
}

/// Chlorophyll concentration at `depth_m` given the surface value.
pub fn chlorophyll_at_depth(surface_chl: f64, depth_m: f64, profile: ChlorophyllProfile) -> f64 {
    match profile {
        ChlorophyllProfile::Surface => surface_chl,
        ChlorophyllProfile::SubsurfaceMaximum { max_depth_m, peak_gain, decay_per_m } => {
            if depth_m <= 0.0 {
                surface_chl
            } else if depth_m <= max_depth_m {
                surface_chl * (1.0 + (depth_m / max_depth_m) * peak_gain)
            } else {
                surface_chl * (1.0 + peak_gain) * (-decay_per_m * (depth_m - max_depth_m)).exp()
            }
        }
    }
}
