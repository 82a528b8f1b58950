//! Hotspot-seeded synthetic points for runs without measured fields.

use std::collections::BTreeMap;

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, LogNormal, Normal};
use rayon::prelude::*;

use super::config::{Hotspot, SyntheticConfig};
use crate::export::{GridSize, Metadata, ModelDocument};
use crate::grid::Bounds;
use crate::model::ConfigError;
use crate::pipeline::{DepthResult, DepthStats, OutputPoint};

/// Dataset name written to `metadata.source_file`.
pub const SYNTHETIC_SOURCE: &str = "Synthetic_MODIS_Data_v1.0";

const SYNTHETIC_NOTE: &str = "Synthetic data based on real oceanographic patterns";

fn normal(mean: f64, sd: f64) -> Result<Normal<f64>, ConfigError> {
    Normal::new(mean, sd).map_err(|_| ConfigError::NonPositive { name: "normal sd", value: sd })
}

fn log_normal(mu: f64, sigma: f64) -> Result<LogNormal<f64>, ConfigError> {
    LogNormal::new(mu, sigma)
        .map_err(|_| ConfigError::NonPositive { name: "log-normal sigma", value: sigma })
}

fn uniform(rng: &mut ChaCha8Rng, lo: f64, hi: f64) -> f64 {
    lo + rng.random::<f64>() * (hi - lo)
}

/// Surface temperature climatology: warm tropics, cooler toward the poles.
fn climatological_sst(lat: f64) -> f64 {
    28.0 - lat.abs() * 0.3
}

fn hotspot_point(hs: &Hotspot, depth_factor: f64, rng: &mut ChaCha8Rng) -> Result<OutputPoint, ConfigError> {
    let lat = normal(hs.lat_center, hs.spread)?.sample(rng).clamp(-85.0, 85.0);
    let lon = normal(hs.lon_center, hs.spread)?.sample(rng).clamp(-180.0, 180.0);

    let dist = (lat - hs.lat_center).hypot(lon - hs.lon_center);
    let base = hs.intensity * (-dist / (hs.spread * 2.0)).exp();
    let intensity = (base * depth_factor * uniform(rng, 0.8, 1.2)).max(1.0);
    let probability = (1.0 - (1.0 - intensity).exp()).clamp(0.1, 0.95);

    let sst = (climatological_sst(lat) + normal(0.0, 2.0)?.sample(rng)).clamp(16.0, 30.0);
    let chl_base = 0.5 + (intensity - 1.0) * 0.8;
    let chlorophyll = (chl_base * log_normal(0.0, 0.5)?.sample(rng)).clamp(0.1, 5.0);

    Ok(OutputPoint { lat, lon, intensity, probability, chlorophyll, sst })
}

fn background_point(
    rng: &mut ChaCha8Rng,
    sst_noise: &Normal<f64>,
    chl_dist: &LogNormal<f64>,
) -> OutputPoint {
    let lat = uniform(rng, -70.0, 70.0);
    let lon = uniform(rng, -180.0, 180.0);
    let intensity = uniform(rng, 1.0, 1.5);
    let probability = uniform(rng, 0.05, 0.25);
    let sst = (climatological_sst(lat) + sst_noise.sample(rng)).clamp(16.0, 30.0);
    let chlorophyll = chl_dist.sample(rng).clamp(0.05, 2.0);
    OutputPoint { lat, lon, intensity, probability, chlorophyll, sst }
}

/// Points of one depth level, already rounded to export precision.
pub fn depth_points(cfg: &SyntheticConfig, depth_index: usize, seed: u64) -> Result<Vec<OutputPoint>, ConfigError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let factor = cfg.depth_factor(depth_index);
    let per_hotspot = (cfg.points_per_hotspot as f64 * factor) as usize;
    let n_background = (cfg.background_points as f64 * factor) as usize;

    let mut points = Vec::with_capacity(per_hotspot * cfg.hotspots.len() + n_background);
    for hs in &cfg.hotspots {
        for _ in 0..per_hotspot {
            points.push(hotspot_point(hs, factor, &mut rng)?.rounded());
        }
    }

    let sst_noise = normal(0.0, 3.0)?;
    let chl_dist = log_normal(-0.5, 0.8)?;
    for _ in 0..n_background {
        points.push(background_point(&mut rng, &sst_noise, &chl_dist).rounded());
    }
    Ok(points)
}

/// Generates a complete synthetic document.
///
/// Each depth level draws from its own generator seeded with
/// `seed + depth`, so levels are reproducible independently.
pub fn generate(cfg: &SyntheticConfig) -> Result<ModelDocument, ConfigError> {
    cfg.validate()?;
    let seed = cfg.seed.unwrap_or_else(rand::random::<u64>);
    info!(
        "generating synthetic data: {} hotspots, {} depth levels, seed {}",
        cfg.hotspots.len(),
        cfg.depths.len(),
        seed
    );

    let depths: BTreeMap<u32, DepthResult> = cfg
        .depths
        .par_iter()
        .enumerate()
        .map(|(i, &depth)| -> Result<(u32, DepthResult), ConfigError> {
            let data = depth_points(cfg, i, seed.wrapping_add(depth as u64))?;
            let stats = DepthStats::from_points(&data).rounded();
            debug!("synthetic depth {} m: {} points", depth, data.len());
            Ok((depth, DepthResult { depth, data, stats }))
        })
        .collect::<Result<_, ConfigError>>()?;

    let mut metadata = Metadata::now(
        SYNTHETIC_SOURCE,
        cfg.depths.clone(),
        GridSize { lat: 180, lon: 360 },
        Bounds { lat_min: -89.0, lat_max: 89.0, lon_min: -179.0, lon_max: 179.0 },
    );
    metadata.note = Some(SYNTHETIC_NOTE.to_string());

    Ok(ModelDocument { metadata, depths })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::check_document;

    #[test]
    fn test_shallowest_level_has_full_point_count() {
        let cfg = SyntheticConfig::with_seed(1);
        let pts = depth_points(&cfg, 0, 1).unwrap();
        assert_eq!(pts.len(), 8 * 80 + 150);
    }

    #[test]
    fn test_point_counts_shrink_with_depth() {
        let doc = generate(&SyntheticConfig::with_seed(7)).unwrap();
        let counts: Vec<usize> = doc.depths.values().map(|d| d.data.len()).collect();
        assert_eq!(counts.len(), 6);
        for w in counts.windows(2) {
            assert!(w[1] < w[0]);
        }
    }

    #[test]
    fn test_values_stay_in_generator_ranges() {
        let doc = generate(&SyntheticConfig::with_seed(3)).unwrap();
        for entry in doc.depths.values() {
            for p in &entry.data {
                assert!(p.intensity >= 1.0);
                assert!(p.probability >= 0.05 && p.probability <= 0.95);
                assert!(p.sst >= 16.0 && p.sst <= 30.0);
                assert!(p.chlorophyll >= 0.05 && p.chlorophyll <= 5.0);
                assert!(p.lat.abs() <= 85.0);
                assert!(p.lon.abs() <= 180.0);
            }
        }
    }

    #[test]
    fn test_document_passes_consistency_check() {
        let doc = generate(&SyntheticConfig::with_seed(11)).unwrap();
        assert_eq!(doc.metadata.source_file, SYNTHETIC_SOURCE);
        assert_eq!(doc.metadata.grid_size, GridSize { lat: 180, lon: 360 });
        assert!(doc.metadata.note.is_some());
        assert!(check_document(&doc).is_clean());
    }

    #[test]
    fn test_same_seed_same_points() {
        let a = generate(&SyntheticConfig::with_seed(5)).unwrap();
        let b = generate(&SyntheticConfig::with_seed(5)).unwrap();
        let c = generate(&SyntheticConfig::with_seed(6)).unwrap();
        assert_eq!(a.depths, b.depths);
        assert_ne!(a.depths, c.depths);
    }

    #[test]
    fn test_stats_are_means_of_written_points() {
        let doc = generate(&SyntheticConfig::with_seed(9)).unwrap();
        let d = &doc.depths[&50];
        let mean = d.data.iter().map(|p| p.intensity).sum::<f64>() / d.data.len() as f64;
        assert!((d.stats.mean_intensity.unwrap() - mean).abs() < 1e-4);
        assert_eq!(d.stats.count, d.data.len());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let cfg = SyntheticConfig { depths: vec![], ..SyntheticConfig::with_seed(1) };
        assert_eq!(generate(&cfg).unwrap_err(), ConfigError::EmptyDepths);
    }
}
