//! Scheduler environment hints.
//!
//! These only feed the result recorder; the core never reads the environment.

use std::env;

/// Total number of allocated nodes from `SLURM_NNODES`, or 1 outside SLURM.
pub fn num_nodes() -> usize {
    parse_nodes(env::var("SLURM_NNODES").ok().as_deref())
}

/// Worker threads available to each rank when `ranks_sharing_pool` ranks run as
/// threads of one process over a single pool of `pool_threads` workers.
///
/// MPI ranks each own their pool, so they pass `ranks_sharing_pool = 1`.
pub fn threads_per_rank(pool_threads: usize, ranks_sharing_pool: usize) -> usize {
    (pool_threads / ranks_sharing_pool.max(1)).max(1)
}

fn parse_nodes(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse().ok()).filter(|&n| n > 0).unwrap_or(1)
}
