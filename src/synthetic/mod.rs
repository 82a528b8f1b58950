//! Synthetic foraging data.
//!
//! Produces a document in the same format as a model run by scattering
//! points around known foraging hotspots, for front-end work when no
//! measured fields are at hand.

mod config;
mod generate;

pub use config::{Hotspot, SyntheticConfig};
pub use generate::{depth_points, generate, SYNTHETIC_SOURCE};
