//! Boundary-plane exchange between adjacent slab owners.
//!
//! Two paired operations per iteration, each moving `ny * nz` values:
//!
//! 1. send owned plane `1` to the left neighbor, receive ghost `local_nx + 1` from the right;
//! 2. send owned plane `local_nx` to the right neighbor, receive ghost `0` from the left.
//!
//! Each direction is a single `Comm::send_recv`, never a separate send followed by a
//! receive: on a chain where every rank sends first, blocking sends would wait on each
//! other forever. Missing neighbors are `None`, so the end ranks do only half of the
//! work and their end ghosts are never touched.

use crate::error::Result;
use crate::grid::{Decomposition, HaloSides, LocalField};
use crate::parallel::Comm;

pub const HALO_TAG_LEFTWARD: i32 = 0;
pub const HALO_TAG_RIGHTWARD: i32 = 1;

/// Refresh both ghost planes of `field` from the neighbors in `decomp`.
///
/// Returns the ghost sides that were written; empty for a single-rank group.
pub fn exchange_halos<C: Comm + ?Sized>(
    comm: &C,
    decomp: &Decomposition,
    field: &mut LocalField,
) -> Result<HaloSides> {
    assert_eq!(field.local_nx(), decomp.local_nx, "field does not match decomposition");
    let n = field.local_nx();
    let p = field.plane_len();
    let data = field.as_mut_slice();

    // leftward: plane 1 -> left, right -> ghost n+1
    let (lo, hi) = data.split_at_mut((n + 1) * p);
    comm.send_recv(&lo[p..2 * p], decomp.left, &mut hi[..p], decomp.right, HALO_TAG_LEFTWARD)?;

    // rightward: plane n -> right, left -> ghost 0
    let (lo, hi) = data.split_at_mut(p);
    comm.send_recv(&hi[(n - 1) * p..n * p], decomp.right, lo, decomp.left, HALO_TAG_RIGHTWARD)?;

    Ok(decomp.linked_sides())
}
