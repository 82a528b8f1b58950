//! Log-linear intensity link with Gaussian jitter.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use super::config::{ConfigError, IntensityConfig};
use super::score::CellScore;
use crate::grid::{Field, Grid};

/// Source of the additive noise term `eps` in the intensity link.
pub trait Jitter {
    /// Draws one noise sample.
    fn sample(&mut self) -> f64;
}

impl<J: Jitter + ?Sized> Jitter for &mut J {
    fn sample(&mut self) -> f64 {
        (**self).sample()
    }
}

impl<J: Jitter + ?Sized> Jitter for Box<J> {
    fn sample(&mut self) -> f64 {
        (**self).sample()
    }
}

/// Always zero; makes the transform a deterministic function of `Bp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn sample(&mut self) -> f64 {
        0.0
    }
}

/// Seeded `N(0, sd)` noise.
#[derive(Debug, Clone)]
pub struct GaussianJitter {
    rng: ChaCha8Rng,
    normal: Normal<f64>,
}

impl GaussianJitter {
    /// Creates a generator with standard deviation `sd`, seeded from `seed`.
    pub fn new(sd: f64, seed: u64) -> Result<Self, ConfigError> {
        let normal = Normal::new(0.0, sd)
            .map_err(|_| ConfigError::NonFinite { name: "noise_sd", value: sd })?;
        Ok(Self { rng: ChaCha8Rng::seed_from_u64(seed), normal })
    }
}

impl Jitter for GaussianJitter {
    fn sample(&mut self) -> f64 {
        self.normal.sample(&mut self.rng)
    }
}

/// Intensity `exp(beta0 + beta1*bp + eps)` for one cell.
pub fn transform<J: Jitter>(bp: f64, cfg: &IntensityConfig, jitter: &mut J) -> f64 {
    (cfg.beta0 + cfg.beta1 * bp + jitter.sample()).exp()
}

/// Applies [`transform`] to every scored cell in row-major order.
///
/// One noise sample is drawn per cell, missing or not, so a given seed maps
/// to the same draw for the same cell regardless of which cells have data.
/// Missing scores and non-finite results are missing intensities.
pub fn transform_field<J: Jitter>(
    scores: &Grid<CellScore>,
    cfg: &IntensityConfig,
    jitter: &mut J,
) -> Field {
    scores.map(|cell| {
        let eps = jitter.sample();
        cell.probability
            .map(|bp| (cfg.beta0 + cfg.beta1 * bp + eps).exp())
            .filter(|l| l.is_finite())
    })
}
