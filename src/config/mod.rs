//! Run configuration: global grid extents, step count, output path and boundary policy.

pub mod options;
pub use options::{BoundaryPolicy, GlobalGrid, RunConfig};
