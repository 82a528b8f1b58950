//! Per-depth output points and summary statistics.

use serde::{Deserialize, Serialize};

/// Decimal places for intensity, probability and chlorophyll.
pub const VALUE_DECIMALS: u32 = 4;
/// Decimal places for temperatures.
pub const SST_DECIMALS: u32 = 2;
/// Decimal places for coordinates.
pub const COORD_DECIMALS: u32 = 4;

/// Rounds `v` to `decimals` places. Non-finite values pass through.
pub fn round_to(v: f64, decimals: u32) -> f64 {
    if !v.is_finite() {
        return v;
    }
    let scale = 10f64.powi(decimals as i32);
    (v * scale).round() / scale
}

/// One emitted grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputPoint {
    pub lat: f64,
    pub lon: f64,
    pub intensity: f64,
    pub probability: f64,
    pub chlorophyll: f64,
    pub sst: f64,
}

impl OutputPoint {
    /// Rounded to the export precision.
    pub fn rounded(&self) -> Self {
        Self {
            lat: round_to(self.lat, COORD_DECIMALS),
            lon: round_to(self.lon, COORD_DECIMALS),
            intensity: round_to(self.intensity, VALUE_DECIMALS),
            probability: round_to(self.probability, VALUE_DECIMALS),
            chlorophyll: round_to(self.chlorophyll, VALUE_DECIMALS),
            sst: round_to(self.sst, SST_DECIMALS),
        }
    }

    /// Range check against physically plausible values.
    ///
    /// Chlorophyll 0–100 mg/m³, SST between the freezing point of seawater
    /// and 35 °C, non-negative intensity, probability in [0, 1].
    pub fn is_plausible(&self) -> bool {
        let in_range = |v: f64, lo: f64, hi: f64| v.is_finite() && v >= lo && v <= hi;
        in_range(self.chlorophyll, 0.0, 100.0)
            && in_range(self.sst, -2.0, 35.0)
            && in_range(self.intensity, 0.0, f64::MAX)
            && in_range(self.probability, 0.0, 1.0)
            && in_range(self.lat, -90.0, 90.0)
            && in_range(self.lon, -180.0, 360.0)
    }
}

/// Summary statistics of one depth level.
///
/// Means are `None` when no cell contributed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthStats {
    pub mean_intensity: Option<f64>,
    pub mean_probability: Option<f64>,
    pub mean_chlorophyll: Option<f64>,
    pub mean_sst: Option<f64>,
    /// Number of emitted points.
    pub count: usize,
}

impl DepthStats {
    pub fn rounded(&self) -> Self {
        Self {
            mean_intensity: self.mean_intensity.map(|v| round_to(v, VALUE_DECIMALS)),
            mean_probability: self.mean_probability.map(|v| round_to(v, VALUE_DECIMALS)),
            mean_chlorophyll: self.mean_chlorophyll.map(|v| round_to(v, VALUE_DECIMALS)),
            mean_sst: self.mean_sst.map(|v| round_to(v, SST_DECIMALS)),
            count: self.count,
        }
    }

    /// Plain means over a list of points.
    pub fn from_points(points: &[OutputPoint]) -> Self {
        let mut acc = [MeanAccumulator::default(); 4];
        for p in points {
            acc[0].push(p.intensity);
            acc[1].push(p.probability);
            acc[2].push(p.chlorophyll);
            acc[3].push(p.sst);
        }
        Self {
            mean_intensity: acc[0].mean(),
            mean_probability: acc[1].mean(),
            mean_chlorophyll: acc[2].mean(),
            mean_sst: acc[3].mean(),
            count: points.len(),
        }
    }
}

/// Running mean that ignores non-finite samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAccumulator {
    sum: f64,
    n: usize,
}

impl MeanAccumulator {
    pub fn push(&mut self, v: f64) {
        if v.is_finite() {
            self.sum += v;
            self.n += 1;
        }
    }

    pub fn push_opt(&mut self, v: Option<f64>) {
        if let Some(v) = v {
            self.push(v);
        }
    }

    pub fn mean(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }
}

/// The stratified field of one depth level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthResult {
    pub depth: u32,
    pub data: Vec<OutputPoint>,
    pub stats: DepthStats,
}

impl DepthResult {
    /// Rounds every point and statistic to the export precision.
    pub fn rounded(&self) -> Self {
        Self {
            depth: self.depth,
            data: self.data.iter().map(OutputPoint::rounded).collect(),
            stats: self.stats.rounded(),
        }
    }
}
