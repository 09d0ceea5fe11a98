//! slabstencil: distributed 3-D Jacobi stencil benchmark
//!
//! Each rank owns a contiguous slab of a global grid along x, exchanges boundary
//! planes with its neighbors every iteration and recomputes its interior with a
//! 6-point average on the rayon pool. Per-rank timings and a field checksum are
//! reduced onto the leader, which appends one CSV row per run.
//!
//! Ranks are either MPI processes (feature `mpi`) or threads of one process
//! ([`parallel::ThreadComm`]); the core only sees the [`parallel::Comm`] trait.

pub mod parallel;

pub mod config;
pub mod driver;
pub mod error;
pub mod grid;
pub mod metrics;
pub mod output;
pub mod stencil;
pub mod utils;

// Re-exports for convenience
pub use config::*;
pub use driver::{run_benchmark, DriverState, IterationDriver};
pub use error::*;
pub use grid::*;
pub use metrics::*;
pub use stencil::*;
