//! Loading measured fields into a [`FieldSet`](crate::grid::FieldSet).
//!
//! Field files are JSON grids already co-registered on one latitude and
//! longitude grid. SST may be given as bleaching alert codes and SSHA as
//! raw anomalies; both are converted to model units on load.

mod convert;
mod file;

pub use convert::{normalize_ssha, sst_from_bleaching_alert, sst_proxy_field, SSHA_RAW_LIMIT_CM};
pub use file::{load_field_file, Coordinates, FieldFile, IngestError, IngestOptions, SshaKind, SstKind};
