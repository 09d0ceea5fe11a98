//! Immutable run parameters shared by every rank.
//!
//! This module provides the `GlobalGrid` and `RunConfig` structs, which are built
//! once at startup (usually by the command-line layer) and then passed by reference
//! into decomposition, the iteration driver and the result recorder. Nothing in the
//! core mutates them after construction.

use std::path::PathBuf;

use crate::error::{Result, StencilError};

pub const DEFAULT_NX: usize = 128;
pub const DEFAULT_NY: usize = 128;
pub const DEFAULT_NZ: usize = 128;
pub const DEFAULT_STEPS: usize = 200;
pub const DEFAULT_OUTPUT: &str = "results/strong_scaling_template.csv";

/// Full problem size, identical on every rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalGrid {
    /// Extent along the decomposed axis.
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl GlobalGrid {
    /// Build a grid, rejecting zero extents.
    pub fn new(nx: usize, ny: usize, nz: usize) -> Result<Self> {
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(StencilError::InvalidConfig(format!(
                "grid dimensions must be positive, got {nx} x {ny} x {nz}"
            )));
        }
        Ok(Self { nx, ny, nz })
    }

    /// Number of values in one x-plane (the halo message size), or `None` if it
    /// does not fit in `usize`.
    pub fn plane_len(&self) -> Option<usize> {
        self.ny.checked_mul(self.nz)
    }

    /// Total number of cells in the global grid, as a float so that any
    /// accepted extents can be counted.
    pub fn cells(&self) -> f64 {
        self.nx as f64 * self.ny as f64 * self.nz as f64
    }
}

impl Default for GlobalGrid {
    fn default() -> Self {
        Self { nx: DEFAULT_NX, ny: DEFAULT_NY, nz: DEFAULT_NZ }
    }
}

/// What the ghost plane at an open end of the rank chain holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryPolicy {
    /// Initial condition evaluated one plane outside the domain, fixed for the run.
    #[default]
    Dirichlet,
    /// Zero-valued end ghosts.
    Zero,
}

/// Stencil run parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub grid: GlobalGrid,
    /// Number of Jacobi iterations.
    pub steps: usize,
    /// CSV file the leader appends its result row to.
    pub output: PathBuf,
    pub boundary: BoundaryPolicy,
}

impl RunConfig {
    pub fn new(grid: GlobalGrid, steps: usize, output: impl Into<PathBuf>) -> Self {
        Self { grid, steps, output: output.into(), boundary: BoundaryPolicy::default() }
    }

    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }

    /// Total cell updates performed by the run (nx·ny·nz·steps).
    pub fn total_updates(&self) -> f64 {
        self.grid.cells() * self.steps as f64
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(GlobalGrid::default(), DEFAULT_STEPS, DEFAULT_OUTPUT)
    }
}
