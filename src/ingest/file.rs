//! JSON field files: the gridded input of a model run.

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::convert::{normalize_ssha, sst_proxy_field};
use crate::grid::{Field, FieldSet, Grid, GridError};

/// Errors that can occur while loading a field file.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid grid: {0}")]
    Grid(#[from] GridError),
    #[error("No usable SSHA values after range filtering")]
    NoSshaData,
}

/// How the `sst` grid is encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SstKind {
    /// Degrees Celsius.
    #[default]
    Celsius,
    /// Coral Reef Watch bleaching alert area codes, converted to an SST proxy.
    BleachingAlert,
}

/// How the `ssha` grid is encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SshaKind {
    /// Already on the model scale (mean ~50).
    #[default]
    Normalized,
    /// Raw anomaly in cm, normalized on load.
    RawCm,
}

/// Latitude or longitude given as a 1-D axis or a full 2-D grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinates {
    Axis(Vec<f64>),
    Grid(Vec<Vec<f64>>),
}

fn default_source() -> String {
    "unknown".to_string()
}

/// On-disk layout of a field file. `null` cells are missing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFile {
    #[serde(default = "default_source")]
    pub source: String,
    pub lat: Coordinates,
    pub lon: Coordinates,
    pub sst: Vec<Vec<Option<f64>>>,
    #[serde(default)]
    pub sst_kind: SstKind,
    pub ssha: Vec<Vec<Option<f64>>>,
    #[serde(default)]
    pub ssha_kind: SshaKind,
    pub chlorophyll: Vec<Vec<Option<f64>>>,
}

/// Load-time preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Keep every `downsample`-th row and column before any conversion.
    pub downsample: usize,
    /// Flip the grids when latitude decreases with row index.
    pub ascending_latitude: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self { downsample: 1, ascending_latitude: true }
    }
}

impl FieldFile {
    pub fn from_json_str(text: &str) -> Result<Self, IngestError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn read(path: &Path) -> Result<Self, IngestError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Converts the file into a validated [`FieldSet`].
    ///
    /// Downsampling happens first, so SSHA normalization statistics are
    /// taken over the cells that are actually scored.
    pub fn into_field_set(self, opts: &IngestOptions) -> Result<FieldSet, IngestError> {
        let step = opts.downsample;
        let (lat, lon) = coordinate_grids(self.lat, self.lon)?;
        let lat = lat.downsample(step)?;
        let lon = lon.downsample(step)?;

        let sst = Grid::from_rows(self.sst)?.downsample(step)?;
        let sst = match self.sst_kind {
            SstKind::Celsius => sst,
            SstKind::BleachingAlert => sst_proxy_field(&sst),
        };

        let ssha = Grid::from_rows(self.ssha)?.downsample(step)?;
        let ssha = match self.ssha_kind {
            SshaKind::Normalized => ssha,
            SshaKind::RawCm => normalize_ssha(&ssha).ok_or(IngestError::NoSshaData)?,
        };

        let chl = Grid::from_rows(self.chlorophyll)?.downsample(step)?;

        let fields = FieldSet::new(self.source, finite(sst), finite(ssha), finite(chl), lat, lon)?;
        let (rows, cols) = fields.shape();
        debug!(
            "{}: {}x{} cells, {} with SST, {} with SSHA, {} with chlorophyll",
            fields.source,
            rows,
            cols,
            fields.sst().present_count(),
            fields.ssha().present_count(),
            fields.chlorophyll().present_count()
        );

        if opts.ascending_latitude && fields.latitude_descending() {
            info!("{}: flipping descending latitude axis", fields.source);
            return Ok(fields.with_ascending_latitude());
        }
        Ok(fields)
    }
}

/// Reads and converts a field file in one step.
pub fn load_field_file(path: &Path, opts: &IngestOptions) -> Result<FieldSet, IngestError> {
    info!("loading fields from {}", path.display());
    FieldFile::read(path)?.into_field_set(opts)
}

fn coordinate_grids(lat: Coordinates, lon: Coordinates) -> Result<(Grid<f64>, Grid<f64>), GridError> {
    match (lat, lon) {
        (Coordinates::Axis(la), Coordinates::Axis(lo)) => FieldSet::meshgrid(&la, &lo),
        (Coordinates::Grid(la), Coordinates::Grid(lo)) => {
            Ok((Grid::from_rows(la)?, Grid::from_rows(lo)?))
        }
        (Coordinates::Axis(la), Coordinates::Grid(lo)) => {
            let lo = Grid::from_rows(lo)?;
            if lo.is_empty() {
                return Err(GridError::Empty);
            }
            let (lat, _) = FieldSet::meshgrid(&la, &lo.values()[..lo.cols()])?;
            Ok((lat, lo))
        }
        (Coordinates::Grid(la), Coordinates::Axis(lo)) => {
            let la = Grid::from_rows(la)?;
            if la.is_empty() {
                return Err(GridError::Empty);
            }
            let lat_axis: Vec<f64> = (0..la.rows()).map(|r| la.values()[r * la.cols()]).collect();
            let (_, lon) = FieldSet::meshgrid(&lat_axis, &lo)?;
            Ok((la, lon))
        }
    }
}

/// NaN and infinities in the file are treated as missing.
fn finite(field: Field) -> Field {
    field.map(|v| v.filter(|x| x.is_finite()))
}
