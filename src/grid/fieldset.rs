//! The co-registered input bundle handed to the scoring core.

use serde::{Deserialize, Serialize};

use super::field::{Field, Grid, GridError};

/// Geographic extent of a grid in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

/// SST, SSHA and chlorophyll fields plus their latitude/longitude grids.
///
/// Construction checks that every grid has the same shape, so the scorer
/// can index all five in lockstep without broadcasting.
#[derive(Debug, Clone)]
pub struct FieldSet {
    /// Name of the dataset the fields came from.
    pub source: String,
    sst: Field,
    ssha: Field,
    chlorophyll: Field,
    lat: Grid<f64>,
    lon: Grid<f64>,
}

impl FieldSet {
    /// Bundles the fields, failing if any shape differs from the latitude grid.
    pub fn new(
        source: impl Into<String>,
        sst: Field,
        ssha: Field,
        chlorophyll: Field,
        lat: Grid<f64>,
        lon: Grid<f64>,
    ) -> Result<Self, GridError> {
        let expected = lat.shape();
        if lat.is_empty() {
            return Err(GridError::Empty);
        }
        for (name, shape) in [
            ("lon", lon.shape()),
            ("sst", sst.shape()),
            ("ssha", ssha.shape()),
            ("chlorophyll", chlorophyll.shape()),
        ] {
            if shape != expected {
                return Err(GridError::ShapeMismatch {
                    name: name.to_string(),
                    expected,
                    found: shape,
                });
            }
        }
        Ok(Self { source: source.into(), sst, ssha, chlorophyll, lat, lon })
    }

    /// Expands 1-D latitude and longitude axes into 2-D grids (row = latitude).
    pub fn meshgrid(lat_axis: &[f64], lon_axis: &[f64]) -> Result<(Grid<f64>, Grid<f64>), GridError> {
        let rows = lat_axis.len();
        let cols = lon_axis.len();
        if rows == 0 || cols == 0 {
            return Err(GridError::Empty);
        }
        let mut lat = Vec::with_capacity(rows * cols);
        let mut lon = Vec::with_capacity(rows * cols);
        for &la in lat_axis {
            for &lo in lon_axis {
                lat.push(la);
                lon.push(lo);
            }
        }
        Ok((Grid::new(rows, cols, lat)?, Grid::new(rows, cols, lon)?))
    }

    /// A set where every cell carries the same values. Mostly useful for tests
    /// and calibration runs.
    pub fn uniform(
        rows: usize,
        cols: usize,
        sst: f64,
        ssha: f64,
        chlorophyll: f64,
        lat: f64,
        lon: f64,
    ) -> Result<Self, GridError> {
        Self::new(
            "uniform",
            Grid::filled(rows, cols, Some(sst)),
            Grid::filled(rows, cols, Some(ssha)),
            Grid::filled(rows, cols, Some(chlorophyll)),
            Grid::filled(rows, cols, lat),
            Grid::filled(rows, cols, lon),
        )
    }

    pub fn sst(&self) -> &Field {
        &self.sst
    }

    pub fn ssha(&self) -> &Field {
        &self.ssha
    }

    pub fn chlorophyll(&self) -> &Field {
        &self.chlorophyll
    }

    pub fn lat(&self) -> &Grid<f64> {
        &self.lat
    }

    pub fn lon(&self) -> &Grid<f64> {
        &self.lon
    }

    /// Returns `(rows, cols)` shared by all grids.
    pub fn shape(&self) -> (usize, usize) {
        self.lat.shape()
    }

    /// Min/max of the coordinate grids.
    pub fn bounds(&self) -> Bounds {
        let (lat_min, lat_max) = min_max(self.lat.values());
        let (lon_min, lon_max) = min_max(self.lon.values());
        Bounds { lat_min, lat_max, lon_min, lon_max }
    }

    /// Keeps every `step`-th row and column of all grids.
    pub fn downsample(&self, step: usize) -> Result<Self, GridError> {
        Ok(Self {
            source: self.source.clone(),
            sst: self.sst.downsample(step)?,
            ssha: self.ssha.downsample(step)?,
            chlorophyll: self.chlorophyll.downsample(step)?,
            lat: self.lat.downsample(step)?,
            lon: self.lon.downsample(step)?,
        })
    }

    /// Returns true if latitude decreases from the first to the last row.
    pub fn latitude_descending(&self) -> bool {
        let first = self.lat.get(0, 0).copied().unwrap_or(0.0);
        let last = self.lat.get(self.lat.rows().saturating_sub(1), 0).copied().unwrap_or(0.0);
        first > last
    }

    /// Flips every grid so latitude increases with row index.
    pub fn with_ascending_latitude(self) -> Self {
        if !self.latitude_descending() {
            return self;
        }
        Self {
            source: self.source,
            sst: self.sst.flip_rows(),
            ssha: self.ssha.flip_rows(),
            chlorophyll: self.chlorophyll.flip_rows(),
            lat: self.lat.flip_rows(),
            lon: self.lon.flip_rows(),
        }
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for &v in values {
        if v.is_finite() {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if min > max {
        (0.0, 0.0)
    } else {
        (min, max)
    }
}
