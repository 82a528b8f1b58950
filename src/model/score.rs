//! Depth-adjusted Gaussian suitability score.

use super::config::ScoringConfig;
use super::profile::{chlorophyll_at_depth, temperature_at_depth};
use crate::grid::{FieldSet, Grid};

/// Per-cell scoring result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellScore {
    /// Suitability `Bp` in [0, 1]; `None` when SSHA or chlorophyll is missing.
    pub probability: Option<f64>,
    /// Temperature after the depth adjustment, if SST was present.
    pub adjusted_sst: Option<f64>,
    /// True when the adjusted SST fell at or below the cold cutoff.
    pub cold_suppressed: bool,
    pub sst_score: f64,
    pub ssha_score: Option<f64>,
    pub chl_score: Option<f64>,
}

impl CellScore {
    /// A cell with no usable data at all.
    pub const MISSING: CellScore = CellScore {
        probability: None,
        adjusted_sst: None,
        cold_suppressed: false,
        sst_score: 0.0,
        ssha_score: None,
        chl_score: None,
    };

    /// True if the cell has a suitability score and is either warm enough or
    /// `keep_cold` is set.
    pub fn is_usable(&self, keep_cold: bool) -> bool {
        self.probability.is_some() && (keep_cold || !self.cold_suppressed)
    }
}

/// Unnormalized Gaussian similarity `exp(-(x-mu)^2 / (2 sigma^2))`.
#[inline]
pub fn gaussian(x: f64, mu: f64, sigma: f64) -> f64 {
    let d = x - mu;
    (-(d * d) / (2.0 * sigma * sigma)).exp()
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// Scores a single cell at `depth_m`.
///
/// Missing SST contributes a zero SST component and never triggers the
/// cold cutoff. Missing SSHA or chlorophyll makes the whole score missing.
pub fn score_cell(
    sst: Option<f64>,
    ssha: Option<f64>,
    chl: Option<f64>,
    latitude_deg: f64,
    depth_m: u32,
    cfg: &ScoringConfig,
) -> CellScore {
    let depth = depth_m as f64;

    let adjusted_sst = finite(sst)
        .map(|t| temperature_at_depth(t, latitude_deg, depth, cfg))
        .filter(|t| t.is_finite());
    let cold_suppressed = matches!(adjusted_sst, Some(t) if t <= cfg.cold_cutoff_c);
    let sst_score = match adjusted_sst {
        Some(t) if !cold_suppressed => gaussian(t, cfg.mu_sst, cfg.sigma_sst),
        _ => 0.0,
    };

    let ssha_score = finite(ssha).map(|h| gaussian(h, cfg.mu_ssha, cfg.sigma_ssha));
    let chl_score = finite(chl).map(|c| {
        let c = chlorophyll_at_depth(c, depth, cfg.chlorophyll_profile);
        let chl_log = c.max(cfg.chl_floor).ln();
        gaussian(chl_log, cfg.mu_chl.ln(), cfg.sigma_chl)
    });

    let [w0, w1, w2] = cfg.weights;
    let probability = match (ssha_score, chl_score) {
        (Some(h), Some(c)) => Some((w0 * sst_score + w1 * h + w2 * c).clamp(0.0, 1.0)),
        _ => None,
    };

    CellScore { probability, adjusted_sst, cold_suppressed, sst_score, ssha_score, chl_score }
}

/// Scores every cell of `fields` at `depth_m`. Cells are scored in parallel.
pub fn score_field(fields: &FieldSet, depth_m: u32, cfg: &ScoringConfig) -> Grid<CellScore> {
    let sst = fields.sst().values();
    let ssha = fields.ssha().values();
    let chl = fields.chlorophyll().values();

    fields
        .lat()
        .par_map_indexed(|i, &lat| score_cell(sst[i], ssha[i], chl[i], lat, depth_m, cfg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ScoringConfig {
        ScoringConfig::default()
    }

    #[test]
    fn test_usable_cells() {
        let warm = score_cell(Some(24.0), Some(50.0), Some(0.5), 0.0, 0, &cfg());
        let cold = score_cell(Some(24.0), Some(50.0), Some(0.5), 0.0, 300, &cfg());
        let missing = score_cell(Some(24.0), None, Some(0.5), 0.0, 0, &cfg());
        assert!(warm.is_usable(false));
        assert!(!cold.is_usable(false));
        assert!(cold.is_usable(true));
        assert!(!missing.is_usable(true));
        assert!(!CellScore::MISSING.is_usable(true));
    }

    #[test]
    fn test_peak_conditions_score_one_at_surface() {
        let s = score_cell(Some(24.0), Some(50.0), Some(0.5), 0.0, 0, &cfg());
        let p = s.probability.unwrap();
        assert!((p - 1.0).abs() < 1e-12, "got {}", p);
        assert!(!s.cold_suppressed);
    }

    #[test]
    fn test_deep_equatorial_cell_is_cold_suppressed() {
        // lapse 0.02 at the equator, 24 - 0.02*300 = 18 <= 18.1
        let s = score_cell(Some(24.0), Some(50.0), Some(0.5), 0.0, 300, &cfg());
        assert!(s.cold_suppressed);
        assert_eq!(s.sst_score, 0.0);
        assert!((s.probability.unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_cold_cutoff_ignores_other_signals() {
        for ssha in [-100.0, 0.0, 50.0, 300.0] {
            for chl in [0.0, 0.01, 0.5, 20.0] {
                let s = score_cell(Some(15.0), Some(ssha), Some(chl), 45.0, 50, &cfg());
                assert!(s.cold_suppressed);
                assert_eq!(s.sst_score, 0.0);
            }
        }
    }

    #[test]
    fn test_score_is_always_within_unit_interval() {
        let heavy = ScoringConfig { weights: [0.9, 0.9, 0.9], ..cfg() };
        for c in [cfg(), heavy] {
            for sst in [-2.0, 10.0, 18.2, 22.0, 24.0, 26.0, 35.0] {
                for ssha in [-200.0, 0.0, 50.0, 80.0, 400.0] {
                    for chl in [-1.0, 0.0, 0.001, 0.5, 3.0, 80.0] {
                        for depth in [0, 50, 150, 300] {
                            let p = score_cell(Some(sst), Some(ssha), Some(chl), 20.0, depth, &c)
                                .probability
                                .unwrap();
                            assert!((0.0..=1.0).contains(&p));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_missing_sst_scores_zero_without_suppression() {
        for sst in [None, Some(f64::NAN)] {
            let s = score_cell(sst, Some(50.0), Some(0.5), 0.0, 300, &cfg());
            assert!(!s.cold_suppressed);
            assert_eq!(s.sst_score, 0.0);
            assert_eq!(s.adjusted_sst, None);
            assert!((s.probability.unwrap() - 0.6).abs() < 1e-12);
        }
    }

    #[test]
    fn test_missing_ssha_or_chlorophyll_is_missing_score() {
        assert_eq!(score_cell(Some(24.0), None, Some(0.5), 0.0, 0, &cfg()).probability, None);
        assert_eq!(score_cell(Some(24.0), Some(50.0), None, 0.0, 0, &cfg()).probability, None);
        assert_eq!(
            score_cell(Some(24.0), Some(f64::NAN), Some(0.5), 0.0, 0, &cfg()).probability,
            None
        );
    }

    #[test]
    fn test_non_positive_chlorophyll_is_floored() {
        let a = score_cell(Some(24.0), Some(50.0), Some(0.0), 0.0, 0, &cfg());
        let b = score_cell(Some(24.0), Some(50.0), Some(-5.0), 0.0, 0, &cfg());
        let c = score_cell(Some(24.0), Some(50.0), Some(1e-3), 0.0, 0, &cfg());
        assert_eq!(a.chl_score, c.chl_score);
        assert_eq!(b.chl_score, c.chl_score);
        assert!(a.probability.unwrap().is_finite());
    }

    #[test]
    fn test_deeper_is_colder_until_cutoff() {
        let mut prev = f64::INFINITY;
        let mut suppressed_at = None;
        for depth in (0..=400).step_by(10) {
            let s = score_cell(Some(27.0), Some(50.0), Some(0.5), 30.0, depth, &cfg());
            if let Some(t) = s.adjusted_sst {
                assert!(t < prev);
                prev = t;
            }
            if s.cold_suppressed && suppressed_at.is_none() {
                suppressed_at = Some(depth);
            }
            if let Some(d) = suppressed_at {
                assert!(depth >= d);
                assert_eq!(s.sst_score, 0.0);
            }
        }
        assert!(suppressed_at.is_some());
    }

    #[test]
    fn test_score_field_matches_cellwise_scoring() {
        let fields = FieldSet::uniform(4, 3, 24.0, 50.0, 0.5, 0.0, 10.0).unwrap();
        let g = score_field(&fields, 0, &cfg());
        assert_eq!(g.shape(), (4, 3));
        assert!(g.iter().all(|c| (c.probability.unwrap() - 1.0).abs() < 1e-12));

        let g = score_field(&fields, 300, &cfg());
        assert!(g.iter().all(|c| c.cold_suppressed && (c.probability.unwrap() - 0.6).abs() < 1e-12));
    }
}
