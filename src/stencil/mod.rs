//! Per-iteration operations: the halo exchange and the 6-point Jacobi kernel.

pub mod halo;
pub mod kernel;

pub use halo::{exchange_halos, HALO_TAG_LEFTWARD, HALO_TAG_RIGHTWARD};
pub use kernel::{interior_cells, jacobi_step};
