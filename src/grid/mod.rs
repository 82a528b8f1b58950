//! Co-registered raster fields.
//!
//! Provides the row-major `Grid` container and the `FieldSet` bundle of
//! SST, SSHA and chlorophyll fields sharing one latitude/longitude grid.

mod field;
mod fieldset;

pub use field::{Field, Grid, GridError};
pub use fieldset::{Bounds, FieldSet};
