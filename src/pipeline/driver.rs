//! Multi-depth driver: score, transform and sample every depth level.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use rayon::prelude::*;
use thiserror::Error;

use super::config::RunConfig;
use super::result::{DepthResult, DepthStats, MeanAccumulator, OutputPoint};
use crate::grid::{Field, FieldSet, Grid, GridError};
use crate::model::{score_field, transform_field, CellScore, ConfigError, GaussianJitter, Jitter};

/// Errors that abort a run before any depth is processed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid input fields: {0}")]
    Grid(#[from] GridError),
}

/// A failure confined to a single depth pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DepthError {
    #[error("Depth {depth} m: could not create noise source: {source}")]
    Jitter { depth: u32, source: ConfigError },
    #[error("Depth {depth} m: {reason}")]
    Failed { depth: u32, reason: String },
}

/// Outcome of a multi-depth run, keyed and ordered by depth.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Base seed of the Gaussian jitter. `None` when the caller supplied
    /// the noise sources.
    pub seed: Option<u64>,
    pub results: BTreeMap<u32, Result<DepthResult, DepthError>>,
}

impl RunReport {
    /// Successful depth results in depth order.
    pub fn successes(&self) -> impl Iterator<Item = &DepthResult> {
        self.results.values().filter_map(|r| r.as_ref().ok())
    }

    /// Failed depths in depth order.
    pub fn failures(&self) -> impl Iterator<Item = &DepthError> {
        self.results.values().filter_map(|r| r.as_ref().err())
    }

    pub fn is_complete(&self) -> bool {
        self.results.values().all(Result::is_ok)
    }

    /// Total emitted points over all successful depths.
    pub fn total_points(&self) -> usize {
        self.successes().map(|r| r.data.len()).sum()
    }
}

/// Runs one depth pass with the given noise source.
///
/// Statistics cover every full-resolution cell that has a score and an
/// intensity; only every `stride`-th row and column is emitted as a point.
pub fn run_depth<J: Jitter>(
    fields: &FieldSet,
    depth_m: u32,
    cfg: &RunConfig,
    jitter: &mut J,
) -> DepthResult {
    let scores = score_field(fields, depth_m, &cfg.scoring);
    let intensity = transform_field(&scores, &cfg.intensity, jitter);
    let usable = |cell: &CellScore| cell.is_usable(cfg.emit_cold_suppressed);

    let stats = full_field_stats(fields, &scores, &intensity, &usable);

    let mut data = Vec::new();
    for (r, c) in scores.strided_coords(cfg.stride) {
        let i = scores.index(r, c);
        let cell = &scores.values()[i];
        if !usable(cell) {
            continue;
        }
        let (Some(bp), Some(lambda)) = (cell.probability, intensity.values()[i]) else {
            continue;
        };
        data.push(OutputPoint {
            lat: fields.lat().values()[i],
            lon: fields.lon().values()[i],
            intensity: lambda,
            probability: bp,
            chlorophyll: fields.chlorophyll().values()[i].unwrap_or(0.0),
            sst: fields.sst().values()[i].filter(|v| v.is_finite()).unwrap_or(0.0),
        });
    }

    let stats = DepthStats { count: data.len(), ..stats };
    debug!(
        "depth {} m: {} points, mean probability {:?}, mean intensity {:?}",
        depth_m, stats.count, stats.mean_probability, stats.mean_intensity
    );
    DepthResult { depth: depth_m, data, stats }
}

fn full_field_stats(
    fields: &FieldSet,
    scores: &Grid<CellScore>,
    intensity: &Field,
    usable: &dyn Fn(&CellScore) -> bool,
) -> DepthStats {
    let mut acc = [MeanAccumulator::default(); 4];
    for (i, cell) in scores.iter().enumerate() {
        let Some(lambda) = intensity.values()[i] else { continue };
        if !usable(cell) {
            continue;
        }
        acc[0].push(lambda);
        acc[1].push_opt(cell.probability);
        acc[2].push_opt(fields.chlorophyll().values()[i]);
        acc[3].push_opt(fields.sst().values()[i]);
    }
    DepthStats {
        mean_intensity: acc[0].mean(),
        mean_probability: acc[1].mean(),
        mean_chlorophyll: acc[2].mean(),
        mean_sst: acc[3].mean(),
        count: 0,
    }
}

/// Runs every configured depth with seeded Gaussian jitter.
pub fn run_depths(fields: &FieldSet, cfg: &RunConfig) -> Result<RunReport, PipelineError> {
    run_depths_with_callbacks(fields, cfg, |_| {}, |_, _| {})
}

/// Like [`run_depths`], reporting each depth as it starts and finishes.
///
/// Depths run in parallel, so the callbacks may be invoked from several
/// threads and in any order.
pub fn run_depths_with_callbacks<F1, F2>(
    fields: &FieldSet,
    cfg: &RunConfig,
    on_depth_start: F1,
    on_depth_complete: F2,
) -> Result<RunReport, PipelineError>
where
    F1: Fn(u32) + Sync,
    F2: Fn(u32, &Result<DepthResult, DepthError>) + Sync,
{
    let seed = cfg.seed.unwrap_or_else(rand::random::<u64>);
    let sd = cfg.intensity.noise_sd;
    let make_jitter = |depth: u32| {
        GaussianJitter::new(sd, RunConfig::depth_seed(seed, depth))
            .map_err(|source| DepthError::Jitter { depth, source })
    };
    run_depths_inner(fields, cfg, Some(seed), make_jitter, on_depth_start, on_depth_complete)
}

/// Runs every configured depth with caller-supplied noise sources.
///
/// `make_jitter` is called once per depth; an error there fails only that
/// depth.
pub fn run_depths_with_jitter<J, M>(
    fields: &FieldSet,
    cfg: &RunConfig,
    make_jitter: M,
) -> Result<RunReport, PipelineError>
where
    J: Jitter,
    M: Fn(u32) -> Result<J, DepthError> + Sync,
{
    run_depths_inner(fields, cfg, None, make_jitter, |_| {}, |_, _| {})
}

fn run_depths_inner<J, M, F1, F2>(
    fields: &FieldSet,
    cfg: &RunConfig,
    seed: Option<u64>,
    make_jitter: M,
    on_depth_start: F1,
    on_depth_complete: F2,
) -> Result<RunReport, PipelineError>
where
    J: Jitter,
    M: Fn(u32) -> Result<J, DepthError> + Sync,
    F1: Fn(u32) + Sync,
    F2: Fn(u32, &Result<DepthResult, DepthError>) + Sync,
{
    cfg.validate()?;
    if cfg.scoring.weight_sum() > 1.0 + 1e-9 {
        warn!(
            "scoring weights sum to {:.3}; scores above 1 will be clipped",
            cfg.scoring.weight_sum()
        );
    }
    let (rows, cols) = fields.shape();
    info!(
        "scoring {} ({}x{}) at {} depth levels, stride {}, seed {:?}",
        fields.source,
        rows,
        cols,
        cfg.depths.len(),
        cfg.stride,
        seed
    );

    let results: BTreeMap<u32, Result<DepthResult, DepthError>> = cfg
        .depths
        .par_iter()
        .map(|&depth| {
            on_depth_start(depth);
            let result = make_jitter(depth).map(|mut j| run_depth(fields, depth, cfg, &mut j));
            match &result {
                Ok(r) => info!("depth {} m: {} points", depth, r.stats.count),
                Err(e) => warn!("{}", e),
            }
            on_depth_complete(depth, &result);
            (depth, result)
        })
        .collect();

    Ok(RunReport { seed, results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IntensityConfig, NoJitter};

    fn noiseless(depths: Vec<u32>, stride: usize) -> RunConfig {
        RunConfig {
            depths,
            stride,
            seed: Some(1),
            intensity: IntensityConfig::noiseless(),
            ..Default::default()
        }
    }

    #[test]
    fn test_uniform_field_at_surface_scores_one_everywhere() {
        let fields = FieldSet::uniform(10, 10, 24.0, 50.0, 0.5, 0.0, 0.0).unwrap();
        let r = run_depth(&fields, 0, &noiseless(vec![0], 5), &mut NoJitter);
        assert_eq!(r.data.len(), 4);
        for p in &r.data {
            assert!((p.probability - 1.0).abs() < 1e-12);
            assert!((p.intensity - 2.0f64.exp()).abs() < 1e-9);
            assert_eq!(p.sst, 24.0);
            assert_eq!(p.chlorophyll, 0.5);
        }
        assert!((r.stats.mean_probability.unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(r.stats.count, r.data.len());
    }

    #[test]
    fn test_cold_cells_are_excluded_from_points_and_stats() {
        let fields = FieldSet::uniform(6, 6, 24.0, 50.0, 0.5, 0.0, 0.0).unwrap();
        let r = run_depth(&fields, 300, &noiseless(vec![300], 1), &mut NoJitter);
        assert!(r.data.is_empty());
        assert_eq!(r.stats.count, 0);
        assert_eq!(r.stats.mean_probability, None);

        let emit = RunConfig { emit_cold_suppressed: true, ..noiseless(vec![300], 1) };
        let r = run_depth(&fields, 300, &emit, &mut NoJitter);
        assert_eq!(r.data.len(), 36);
        assert!(r.data.iter().all(|p| (p.probability - 0.6).abs() < 1e-12));
    }

    #[test]
    fn test_stats_cover_the_full_field_not_the_sample() {
        // SST varies by column; only column 0 is sampled with stride 5.
        let rows = 5;
        let cols = 5;
        let (lat, lon) = FieldSet::meshgrid(&[0.0; 5], &[0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
        let sst: Vec<Option<f64>> = (0..rows * cols).map(|i| Some(24.0 + (i % cols) as f64)).collect();
        let fields = FieldSet::new(
            "t",
            Grid::new(rows, cols, sst).unwrap(),
            Grid::filled(rows, cols, Some(50.0)),
            Grid::filled(rows, cols, Some(0.5)),
            lat,
            lon,
        )
        .unwrap();
        let r = run_depth(&fields, 0, &noiseless(vec![0], 5), &mut NoJitter);
        assert_eq!(r.data.len(), 1);
        assert_eq!(r.stats.count, 1);
        assert!((r.stats.mean_sst.unwrap() - 26.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_cells_are_skipped_without_biasing_means() {
        let rows = 2;
        let cols = 2;
        let (lat, lon) = FieldSet::meshgrid(&[0.0, 1.0], &[0.0, 1.0]).unwrap();
        let fields = FieldSet::new(
            "t",
            Grid::filled(rows, cols, Some(24.0)),
            Grid::new(rows, cols, vec![Some(50.0), None, Some(50.0), Some(50.0)]).unwrap(),
            Grid::new(rows, cols, vec![Some(0.5), Some(0.5), Some(0.5), Some(9.0)]).unwrap(),
            lat,
            lon,
        )
        .unwrap();
        let r = run_depth(&fields, 0, &noiseless(vec![0], 1), &mut NoJitter);
        assert_eq!(r.data.len(), 3);
        assert_eq!(r.stats.count, 3);
        let chl = (0.5 + 0.5 + 9.0) / 3.0;
        assert!((r.stats.mean_chlorophyll.unwrap() - chl).abs() < 1e-12);
    }

    #[test]
    fn test_run_depths_is_reproducible_with_seed() {
        let fields = FieldSet::uniform(12, 12, 26.0, 40.0, 0.7, 20.0, 0.0).unwrap();
        let cfg = RunConfig::with_seed(42);
        let a = run_depths(&fields, &cfg).unwrap();
        let b = run_depths(&fields, &cfg).unwrap();
        assert_eq!(a.seed, Some(42));
        assert_eq!(a.results.keys().copied().collect::<Vec<_>>(), cfg.depths);
        for (ra, rb) in a.successes().zip(b.successes()) {
            assert_eq!(ra, rb);
        }
        assert!(a.is_complete());
    }

    #[test]
    fn test_invalid_config_aborts_before_any_depth() {
        let fields = FieldSet::uniform(2, 2, 24.0, 50.0, 0.5, 0.0, 0.0).unwrap();
        let cfg = RunConfig { stride: 0, ..Default::default() };
        let started = std::sync::atomic::AtomicUsize::new(0);
        let err = run_depths_with_callbacks(
            &fields,
            &cfg,
            |_| {
                started.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            },
            |_, _| {},
        )
        .unwrap_err();
        assert_eq!(err, PipelineError::Config(ConfigError::ZeroStride));
        assert_eq!(started.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn test_one_failing_depth_does_not_stop_the_others() {
        let fields = FieldSet::uniform(5, 5, 25.0, 50.0, 0.5, 10.0, 0.0).unwrap();
        let cfg = noiseless(vec![50, 100, 150], 1);
        let report = run_depths_with_jitter(&fields, &cfg, |depth| {
            if depth == 100 {
                Err(DepthError::Failed { depth, reason: "no noise".to_string() })
            } else {
                Ok(NoJitter)
            }
        })
        .unwrap();
        assert!(!report.is_complete());
        assert_eq!(report.successes().count(), 2);
        assert_eq!(report.failures().count(), 1);
        assert!(report.results[&100].is_err());
        assert_eq!(report.results[&150].as_ref().unwrap().data.len(), 25);
    }

    #[test]
    fn test_depth_result_is_independent_of_other_depths() {
        let fields = FieldSet::uniform(15, 15, 26.0, 40.0, 0.7, 20.0, 0.0).unwrap();
        let alone = RunConfig { depths: vec![150], ..RunConfig::with_seed(8) };
        let together = RunConfig { depths: vec![50, 150, 300], ..RunConfig::with_seed(8) };
        let a = run_depths(&fields, &alone).unwrap();
        let b = run_depths(&fields, &together).unwrap();
        let ra = a.results[&150].as_ref().unwrap();
        let rb = b.results[&150].as_ref().unwrap();
        assert!(!ra.data.is_empty());
        assert_eq!(ra, rb);
    }

    #[test]
    fn test_caller_supplied_jitter_reports_no_seed() {
        let fields = FieldSet::uniform(3, 3, 25.0, 50.0, 0.5, 10.0, 0.0).unwrap();
        let cfg = RunConfig { depths: vec![50], ..RunConfig::with_seed(4) };
        let report = run_depths_with_jitter(&fields, &cfg, |_| Ok(NoJitter)).unwrap();
        assert_eq!(report.seed, None);
        let report = run_depths(&fields, &cfg).unwrap();
        assert_eq!(report.seed, Some(4));
    }

    #[test]
    fn test_callbacks_fire_once_per_depth() {
        let fields = FieldSet::uniform(3, 3, 25.0, 50.0, 0.5, 10.0, 0.0).unwrap();
        let cfg = RunConfig::with_seed(3);
        let done = std::sync::Mutex::new(Vec::new());
        run_depths_with_callbacks(&fields, &cfg, |_| {}, |d, r| {
            assert!(r.is_ok());
            done.lock().unwrap().push(d);
        })
        .unwrap();
        let mut done = done.into_inner().unwrap();
        done.sort_unstable();
        assert_eq!(done, cfg.depths);
    }
}
