//! Accumulating wall-clock timers for the benchmark phases.

use std::time::{Duration, Instant};

/// Timed phases of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Halo exchange.
    Comm,
    /// Stencil sweep.
    Compute,
    /// Whole barrier-fenced iteration loop.
    Total,
}

/// Per-phase elapsed time, summed over all calls.
#[derive(Debug, Clone, Default)]
pub struct PhaseTimer {
    comm: Duration,
    compute: Duration,
    total: Duration,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f`, charging its elapsed time to `phase`.
    pub fn time<R>(&mut self, phase: Phase, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let out = f();
        self.add(phase, start.elapsed());
        out
    }

    pub fn add(&mut self, phase: Phase, elapsed: Duration) {
        *self.slot(phase) += elapsed;
    }

    pub fn seconds(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Comm => self.comm,
            Phase::Compute => self.compute,
            Phase::Total => self.total,
        }
        .as_secs_f64()
    }

    fn slot(&mut self, phase: Phase) -> &mut Duration {
        match phase {
            Phase::Comm => &mut self.comm,
            Phase::Compute => &mut self.compute,
            Phase::Total => &mut self.total,
        }
    }
}
