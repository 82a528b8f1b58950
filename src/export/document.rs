//! JSON output document for the visualization front end.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{Bounds, FieldSet};
use crate::pipeline::{DepthResult, RunReport};

/// Errors that can occur while writing or reading a document.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Grid dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub lat: usize,
    pub lon: usize,
}

/// Provenance and extent of a model run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub source_file: String,
    /// RFC 3339 timestamp.
    pub processing_date: String,
    pub depths: Vec<u32>,
    pub grid_size: GridSize,
    pub bounds: Bounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Metadata {
    /// Metadata stamped with the current UTC time.
    pub fn now(source_file: impl Into<String>, depths: Vec<u32>, grid_size: GridSize, bounds: Bounds) -> Self {
        Self {
            source_file: source_file.into(),
            processing_date: chrono::Utc::now().to_rfc3339(),
            depths,
            grid_size,
            bounds,
            note: None,
        }
    }
}

/// The complete exported structure: metadata plus one entry per depth.
///
/// Depth keys serialize as strings (`"50"`, `"100"`, ...) and stay in
/// numeric order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    pub metadata: Metadata,
    pub depths: BTreeMap<u32, DepthResult>,
}

impl ModelDocument {
    /// Builds a document from a run over `fields`, rounding every value to
    /// the export precision. Failed depths are left out of `depths` and
    /// out of `metadata.depths`.
    pub fn from_report(fields: &FieldSet, report: &RunReport) -> Self {
        let (rows, cols) = fields.shape();
        let depths: BTreeMap<u32, DepthResult> =
            report.successes().map(|r| (r.depth, r.rounded())).collect();
        let metadata = Metadata::now(
            fields.source.clone(),
            depths.keys().copied().collect(),
            GridSize { lat: rows, lon: cols },
            fields.bounds(),
        );
        Self { metadata, depths }
    }

    /// Total points over all depths.
    pub fn total_points(&self) -> usize {
        self.depths.values().map(|d| d.data.len()).sum()
    }

    pub fn to_json_string(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Writes pretty-printed JSON to `path`.
    pub fn write_json(&self, path: &Path) -> Result<(), ExportError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_json(path: &Path) -> Result<Self, ExportError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IntensityConfig;
    use crate::pipeline::{run_depths, RunConfig};

    fn document() -> ModelDocument {
        let (lat, lon) = FieldSet::meshgrid(
            &[-10.0, -5.0, 0.0, 5.0, 10.0, 15.0],
            &[120.0, 121.0, 122.0, 123.0, 124.0, 125.0, 126.0],
        )
        .unwrap();
        let (rows, cols) = lat.shape();
        let sst = crate::grid::Grid::filled(rows, cols, Some(26.123));
        let ssha = crate::grid::Grid::filled(rows, cols, Some(45.0));
        let chl = crate::grid::Grid::filled(rows, cols, Some(0.61234567));
        let fields = FieldSet::new("test.nc", sst, ssha, chl, lat, lon).unwrap();
        let cfg = RunConfig {
            depths: vec![50, 300],
            stride: 2,
            seed: Some(5),
            ..Default::default()
        };
        let report = run_depths(&fields, &cfg).unwrap();
        ModelDocument::from_report(&fields, &report)
    }

    #[test]
    fn test_metadata_describes_the_grid() {
        let doc = document();
        assert_eq!(doc.metadata.source_file, "test.nc");
        assert_eq!(doc.metadata.grid_size, GridSize { lat: 6, lon: 7 });
        assert_eq!(doc.metadata.bounds.lat_min, -10.0);
        assert_eq!(doc.metadata.bounds.lon_max, 126.0);
        assert_eq!(doc.metadata.depths, vec![50, 300]);
        assert!(chrono::DateTime::parse_from_rfc3339(&doc.metadata.processing_date).is_ok());
    }

    #[test]
    fn test_json_uses_the_visualization_schema() {
        let doc = document();
        let v: serde_json::Value = serde_json::from_str(&doc.to_json_string().unwrap()).unwrap();
        let d50 = &v["depths"]["50"];
        assert_eq!(d50["depth"], 50);
        let first = &d50["data"][0];
        for key in ["lat", "lon", "intensity", "probability", "chlorophyll", "sst"] {
            assert!(first[key].is_number(), "missing {}", key);
        }
        assert_eq!(first["sst"], 26.12);
        assert_eq!(first["chlorophyll"], 0.6123);
        assert_eq!(d50["stats"]["count"], d50["data"].as_array().unwrap().len());
        assert!(v["metadata"].get("note").is_none());
    }

    #[test]
    fn test_round_trip_preserves_depths_counts_and_points() {
        let doc = document();
        let text = doc.to_json_string().unwrap();
        let back = ModelDocument::from_json_str(&text).unwrap();
        assert_eq!(back.depths.keys().collect::<Vec<_>>(), doc.depths.keys().collect::<Vec<_>>());
        for (depth, r) in &doc.depths {
            let b = &back.depths[depth];
            assert_eq!(b.depth, r.depth);
            assert_eq!(b.stats.count, r.stats.count);
            assert_eq!(b.data, r.data);
        }
        assert_eq!(back, doc);
    }

    #[test]
    fn test_write_and_read_file() {
        let doc = document();
        let path = std::env::temp_dir().join(format!("shark_habitat_doc_{}.json", std::process::id()));
        doc.write_json(&path).unwrap();
        let back = ModelDocument::read_json(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back.total_points(), doc.total_points());
    }

    #[test]
    fn test_failed_depths_are_left_out() {
        let fields = FieldSet::uniform(4, 4, 25.0, 50.0, 0.5, 0.0, 0.0).unwrap();
        let cfg = RunConfig {
            depths: vec![50, 100],
            intensity: IntensityConfig::noiseless(),
            ..Default::default()
        };
        let report = crate::pipeline::run_depths_with_jitter(&fields, &cfg, |depth| {
            if depth == 50 {
                Ok(crate::model::NoJitter)
            } else {
                Err(crate::pipeline::DepthError::Failed { depth, reason: "test".into() })
            }
        })
        .unwrap();
        let doc = ModelDocument::from_report(&fields, &report);
        assert_eq!(doc.metadata.depths, vec![50]);
        assert!(doc.depths.contains_key(&50));
        assert!(!doc.depths.contains_key(&100));
    }
}
