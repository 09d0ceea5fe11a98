//! 1-D slab decomposition of the global grid along x.
//!
//! The x axis is split into contiguous, near-equal slabs: with `base = nx / P` and
//! `rem = nx % P`, the first `rem` ranks own `base + 1` planes and the rest own `base`.
//! Every rank computes its own decomposition independently; no communication is
//! needed because all ranks share `nx` and `P`.

use std::ops::Range;

use bitflags::bitflags;

use crate::error::{Result, StencilError};

bitflags! {
    /// Sides of a slab along the decomposed axis.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct HaloSides: u8 {
        /// Towards rank - 1 (ghost plane `i = 0`).
        const LEFT  = 0b01;
        /// Towards rank + 1 (ghost plane `i = local_nx + 1`).
        const RIGHT = 0b10;
        const BOTH  = Self::LEFT.bits() | Self::RIGHT.bits();
    }
}

/// One rank's share of the global grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decomposition {
    pub rank: usize,
    pub ranks: usize,
    /// Owned x-planes (always >= 1).
    pub local_nx: usize,
    /// Global x index of owned plane `i = 1`.
    pub x_offset: usize,
    pub left: Option<usize>,
    pub right: Option<usize>,
}

impl Decomposition {
    /// Compute the slab owned by `rank` in a group of `ranks` processes.
    ///
    /// # Errors
    /// * `InvalidConfig` if `ranks == 0` or `rank >= ranks`.
    /// * `Decomposition` if `nx < ranks`, since some rank would own no plane.
    pub fn new(nx: usize, ranks: usize, rank: usize) -> Result<Self> {
        if ranks == 0 {
            return Err(StencilError::InvalidConfig("process group is empty".into()));
        }
        if rank >= ranks {
            return Err(StencilError::InvalidConfig(format!(
                "rank {rank} out of range for group of {ranks}"
            )));
        }
        if nx < ranks {
            return Err(StencilError::Decomposition { nx, ranks });
        }
        let base = nx / ranks;
        let rem = nx % ranks;
        let local_nx = base + usize::from(rank < rem);
        let x_offset = rank * base + rank.min(rem);
        let left = rank.checked_sub(1);
        let right = (rank + 1 < ranks).then_some(rank + 1);
        Ok(Self { rank, ranks, local_nx, x_offset, left, right })
    }

    /// Global x planes owned by this rank.
    pub fn owned_range(&self) -> Range<usize> {
        self.x_offset..self.x_offset + self.local_nx
    }

    /// Global x coordinate of local plane `i` (ghosts included, so may be -1 or nx).
    pub fn global_x(&self, i: usize) -> i64 {
        self.x_offset as i64 + i as i64 - 1
    }

    /// Sides that have a neighbor and take part in the halo exchange.
    pub fn linked_sides(&self) -> HaloSides {
        let mut sides = HaloSides::empty();
        sides.set(HaloSides::LEFT, self.left.is_some());
        sides.set(HaloSides::RIGHT, self.right.is_some());
        sides
    }

    /// Sides at the open ends of the chain.
    pub fn open_sides(&self) -> HaloSides {
        HaloSides::BOTH.difference(self.linked_sides())
    }

    pub fn is_leader(&self) -> bool {
        self.rank == 0
    }
}

/// Decompositions of every rank in the group, in rank order.
pub fn decompose_all(nx: usize, ranks: usize) -> Result<Vec<Decomposition>> {
    (0..ranks).map(|rank| Decomposition::new(nx, ranks, rank)).collect()
}
