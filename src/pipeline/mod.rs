//! Multi-depth driver.
//!
//! Repeats the scorer and the intensity transform over a list of depth
//! levels, sampling output points and aggregating per-depth statistics.
//! Depth passes share the read-only input fields and run in parallel.

mod config;
mod driver;
mod result;

pub use config::{ConfigLoadError, RunConfig};
pub use driver::{
    run_depth, run_depths, run_depths_with_callbacks, run_depths_with_jitter,
    DepthError, PipelineError, RunReport,
};
pub use result::{
    round_to, DepthResult, DepthStats, MeanAccumulator, OutputPoint,
    COORD_DECIMALS, SST_DECIMALS, VALUE_DECIMALS,
};
