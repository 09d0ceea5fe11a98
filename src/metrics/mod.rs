//! Per-rank measurements and their group-wide reduction.
//!
//! Each rank produces a [`LocalMetrics`] record. [`aggregate`] moves all records to the
//! leader with a single gather and combines them there in rank order: the maximum of
//! each timing and the sum of the checksums. Combining on the leader in a fixed order
//! makes the global checksum independent of message arrival order.

use rayon::prelude::*;

use crate::config::RunConfig;
use crate::error::{Result, StencilError};
use crate::grid::LocalField;
use crate::parallel::Comm;

const RECORD_LEN: usize = 4;

/// Timings (seconds) and checksum of one rank.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalMetrics {
    pub comm_time: f64,
    pub comp_time: f64,
    pub total_time: f64,
    pub checksum: f64,
}

impl LocalMetrics {
    fn to_record(self) -> [f64; RECORD_LEN] {
        [self.comm_time, self.comp_time, self.total_time, self.checksum]
    }

    fn from_record(r: &[f64]) -> Self {
        Self { comm_time: r[0], comp_time: r[1], total_time: r[2], checksum: r[3] }
    }
}

/// Group-wide result, known only to the leader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalMetrics {
    pub ranks: usize,
    pub max_comm: f64,
    pub max_comp: f64,
    pub max_total: f64,
    pub checksum: f64,
}

impl GlobalMetrics {
    /// Combine per-rank records given in rank order.
    pub fn combine(per_rank: &[LocalMetrics]) -> Self {
        per_rank.iter().fold(
            GlobalMetrics {
                ranks: per_rank.len(),
                max_comm: 0.0,
                max_comp: 0.0,
                max_total: 0.0,
                checksum: 0.0,
            },
            |acc, m| GlobalMetrics {
                ranks: acc.ranks,
                max_comm: acc.max_comm.max(m.comm_time),
                max_comp: acc.max_comp.max(m.comp_time),
                max_total: acc.max_total.max(m.total_time),
                checksum: acc.checksum + m.checksum,
            },
        )
    }

    /// Cell updates per second of wall time; 0 when nothing was timed.
    pub fn updates_per_sec(&self, cfg: &RunConfig) -> f64 {
        if self.max_total > 0.0 {
            cfg.total_updates() / self.max_total
        } else {
            0.0
        }
    }
}

/// Sum of all owned cells of `field`, ghosts excluded.
///
/// Planes are summed in parallel and the plane sums are then added in plane order,
/// so the result does not depend on the rayon thread count or on scheduling.
pub fn local_checksum(field: &LocalField) -> f64 {
    let plane_sums: Vec<f64> = field
        .owned()
        .par_chunks(field.plane_len())
        .map(|plane| plane.iter().sum::<f64>())
        .collect();
    plane_sums.iter().sum()
}

/// Reduce every rank's metrics onto rank 0 with one collective.
///
/// Returns `Some` on the leader and `None` elsewhere.
pub fn aggregate<C: Comm + ?Sized>(
    comm: &C,
    local: &LocalMetrics,
) -> Result<Option<GlobalMetrics>> {
    let Some(records) = comm.gather(&local.to_record(), 0)? else {
        return Ok(None);
    };
    if records.len() != RECORD_LEN * comm.size() {
        return Err(StencilError::Comm(format!(
            "metrics gather returned {} values for {} ranks",
            records.len(),
            comm.size()
        )));
    }
    let per_rank: Vec<LocalMetrics> =
        records.chunks_exact(RECORD_LEN).map(LocalMetrics::from_record).collect();
    Ok(Some(GlobalMetrics::combine(&per_rank)))
}
