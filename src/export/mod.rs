//! Export module for writing model runs to the visualization JSON format.
//!
//! One document holds run metadata plus the sampled points and statistics
//! of every depth level; `check` validates a document read back from disk.

mod check;
mod document;

pub use check::{check_document, CheckReport, Issue};
pub use document::{ExportError, GridSize, Metadata, ModelDocument};
