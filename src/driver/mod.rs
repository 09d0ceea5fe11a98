//! Iteration driver: owns the double buffer and sequences exchange, compute and swap.
//!
//! # State machine
//! ```text
//! Initializing -> ( Exchanging -> Computing -> Swapped )* -> Finalizing
//! ```
//! The "current" and "next" roles are tracked by an index into the two owned
//! buffers. A swap flips the index; no data is copied. The timed loop is fenced by
//! a barrier on both ends, so `total_time` covers the same wall-clock window on
//! every rank.

use std::time::Instant;

use crate::config::RunConfig;
use crate::error::Result;
use crate::grid::{Decomposition, InitialCondition, LocalField};
use crate::metrics::{aggregate, local_checksum, GlobalMetrics, LocalMetrics};
use crate::parallel::Comm;
use crate::stencil::{exchange_halos, interior_cells, jacobi_step};
use crate::utils::{Phase, PhaseTimer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Initializing,
    Exchanging,
    Computing,
    Swapped,
    Finalizing,
}

pub struct IterationDriver<'c, C: Comm + ?Sized> {
    comm: &'c C,
    decomp: Decomposition,
    fields: [LocalField; 2],
    /// Index of the buffer holding the current field.
    current: usize,
    state: DriverState,
    timer: PhaseTimer,
    steps_completed: usize,
}

impl<'c, C: Comm + ?Sized> IterationDriver<'c, C> {
    /// Decompose, allocate both buffers and fill them with the initial condition.
    ///
    /// Both buffers get the same initial contents, so cells the kernel never writes
    /// (j/k faces, end-of-chain ghosts) agree whichever buffer is current.
    ///
    /// # Errors
    /// `Decomposition` if `nx` is smaller than the group, `Allocation` if a buffer
    /// cannot be reserved.
    pub fn new(comm: &'c C, cfg: &RunConfig, ic: &dyn InitialCondition) -> Result<Self> {
        let decomp = Decomposition::new(cfg.grid.nx, comm.size(), comm.rank())?;
        let mut fields = [
            LocalField::allocate(&decomp, &cfg.grid)?,
            LocalField::allocate(&decomp, &cfg.grid)?,
        ];
        for field in &mut fields {
            field.initialize(&decomp, ic, cfg.boundary);
        }
        tracing::debug!(
            rank = decomp.rank,
            local_nx = decomp.local_nx,
            x_offset = decomp.x_offset,
            left = ?decomp.left,
            right = ?decomp.right,
            interior_cells = interior_cells(&fields[0]),
            "slab decomposition"
        );
        Ok(Self {
            comm,
            decomp,
            fields,
            current: 0,
            state: DriverState::Initializing,
            timer: PhaseTimer::new(),
            steps_completed: 0,
        })
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn decomposition(&self) -> &Decomposition {
        &self.decomp
    }

    pub fn current(&self) -> &LocalField {
        &self.fields[self.current]
    }

    pub fn next_field(&self) -> &LocalField {
        &self.fields[1 - self.current]
    }

    pub fn steps_completed(&self) -> usize {
        self.steps_completed
    }

    pub fn timer(&self) -> &PhaseTimer {
        &self.timer
    }

    /// One iteration without the surrounding barriers.
    pub fn step(&mut self) -> Result<()> {
        self.state = DriverState::Exchanging;
        let (comm, decomp) = (self.comm, &self.decomp);
        let current = &mut self.fields[self.current];
        self.timer.time(Phase::Comm, || exchange_halos(comm, decomp, current))?;

        self.state = DriverState::Computing;
        let [a, b] = &mut self.fields;
        let (src, dst) = if self.current == 0 { (&*a, b) } else { (&*b, a) };
        self.timer.time(Phase::Compute, || jacobi_step(src, dst));

        self.current = 1 - self.current;
        self.state = DriverState::Swapped;
        self.steps_completed += 1;
        tracing::trace!(rank = self.decomp.rank, step = self.steps_completed, "step done");
        Ok(())
    }

    /// Run `steps` iterations inside a barrier-fenced timing window and return this
    /// rank's metrics, checksum taken from the final current buffer.
    pub fn run(&mut self, steps: usize) -> Result<LocalMetrics> {
        let _span =
            tracing::debug_span!("iteration_driver", rank = self.decomp.rank, steps).entered();
        self.comm.barrier();
        let start = Instant::now();
        for _ in 0..steps {
            self.step()?;
        }
        self.comm.barrier();
        self.timer.add(Phase::Total, start.elapsed());
        self.state = DriverState::Finalizing;

        let metrics = LocalMetrics {
            comm_time: self.timer.seconds(Phase::Comm),
            comp_time: self.timer.seconds(Phase::Compute),
            total_time: self.timer.seconds(Phase::Total),
            checksum: local_checksum(self.current()),
        };
        tracing::debug!(?metrics, "rank finished");
        Ok(metrics)
    }
}

/// Full benchmark on one rank: set up, iterate, reduce.
///
/// Returns the global metrics on the leader and `None` on every other rank.
pub fn run_benchmark<C: Comm + ?Sized>(
    comm: &C,
    cfg: &RunConfig,
    ic: &dyn InitialCondition,
) -> Result<Option<GlobalMetrics>> {
    let mut driver = IterationDriver::new(comm, cfg, ic)?;
    let local = driver.run(cfg.steps)?;
    let global = aggregate(comm, &local)?;
    if let Some(g) = &global {
        tracing::info!(
            ranks = g.ranks,
            nx = cfg.grid.nx,
            ny = cfg.grid.ny,
            nz = cfg.grid.nz,
            steps = cfg.steps,
            total_s = g.max_total,
            compute_s = g.max_comp,
            comm_s = g.max_comm,
            updates_per_sec = g.updates_per_sec(cfg),
            checksum = g.checksum,
            "benchmark complete"
        );
    }
    Ok(global)
}
