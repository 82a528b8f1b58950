//! Depth-stratified shark foraging habitat model.
//!
//! This crate turns co-registered ocean fields (sea surface temperature,
//! sea surface height anomaly and chlorophyll) into a suitability and
//! foraging-intensity field at several depth levels, and writes the result
//! as JSON for web visualization.

pub mod grid;
pub mod model;
pub mod pipeline;
pub mod ingest;
pub mod synthetic;
pub mod export;

pub use grid::{Bounds, Field, FieldSet, Grid, GridError};
pub use model::{score_cell, transform, CellScore, ConfigError, IntensityConfig, ScoringConfig};
pub use pipeline::{run_depths, run_depths_with_callbacks, DepthResult, OutputPoint, RunConfig, RunReport};
pub use ingest::{load_field_file, IngestOptions};
pub use synthetic::SyntheticConfig;
pub use export::{check_document, ModelDocument};
