//! MPI-based process group.
//!
//! This module provides an implementation of the `Comm` trait over the MPI world
//! communicator (the `mpi` crate). It is only available when the `mpi` feature is
//! enabled, and the binary must be started through an MPI launcher (`mpirun`, `srun`).
//!
//! # Threading
//!
//! Only the rank's main thread talks to MPI; rayon workers never do. The
//! communicator is therefore initialized with `Threading::Funneled`.
//!
//! # Halo exchange
//!
//! `send_recv` maps to `MPI_Sendrecv` when both peers exist. At the ends of the
//! chain it degrades to a plain blocking send or receive, which is what
//! `MPI_Sendrecv` with `MPI_PROC_NULL` does. A stalled peer is not detected;
//! the run hangs.
//!
//! # Example
//! ```no_run
//! # #[cfg(feature = "mpi")]
//! # {
//! use slabstencil::parallel::{Comm, MpiComm};
//! let comm = MpiComm::new().unwrap();
//! println!("Rank: {} / {}", comm.rank(), comm.size());
//! comm.barrier();
//! # }
//! ```

use mpi::environment::Universe;
use mpi::point_to_point::send_receive_into_with_tags;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;
use mpi::Threading;

use crate::error::{Result, StencilError};

/// MPI communicator wrapper.
///
/// Owns the `Universe`, so MPI is finalized when this value is dropped.
pub struct MpiComm {
    /// The MPI world communicator (all processes in the job).
    world: SimpleCommunicator,
    /// The rank (ID) of this process within the communicator.
    rank: usize,
    /// The total number of processes in the communicator.
    size: usize,
    _universe: Universe,
}

impl MpiComm {
    /// Initializes MPI with funneled threading.
    ///
    /// # Errors
    /// Returns `StencilError::Comm` if MPI was already initialized.
    pub fn new() -> Result<Self> {
        let (universe, threading) = mpi::initialize_with_threading(Threading::Funneled)
            .ok_or_else(|| StencilError::Comm("MPI already initialized".into()))?;
        if threading < Threading::Funneled {
            tracing::warn!(?threading, "MPI provided a lower threading level than Funneled");
        }
        let world = universe.world();
        let rank = world.rank() as usize;
        let size = world.size() as usize;
        Ok(MpiComm { world, rank, size, _universe: universe })
    }
}

impl super::Comm for MpiComm {
    /// Returns the rank (ID) of this process.
    fn rank(&self) -> usize { self.rank }
    /// Returns the total number of processes in the communicator.
    fn size(&self) -> usize { self.size }
    /// Synchronizes all processes at a barrier.
    fn barrier(&self) { self.world.barrier(); }

    fn send_recv(
        &self,
        send: &[f64],
        dest: Option<usize>,
        recv: &mut [f64],
        source: Option<usize>,
        tag: i32,
    ) -> Result<()> {
        match (dest, source) {
            (Some(dest), Some(source)) => {
                let dest = self.world.process_at_rank(dest as i32);
                let source = self.world.process_at_rank(source as i32);
                send_receive_into_with_tags(send, &dest, tag, recv, &source, tag);
            }
            (Some(dest), None) => {
                self.world.process_at_rank(dest as i32).send_with_tag(send, tag);
            }
            (None, Some(source)) => {
                self.world.process_at_rank(source as i32).receive_into_with_tag(recv, tag);
            }
            (None, None) => {}
        }
        Ok(())
    }

    /// Gathers equally sized slices to `root` (`MPI_Gather`).
    fn gather(&self, local: &[f64], root: usize) -> Result<Option<Vec<f64>>> {
        let root_process = self.world.process_at_rank(root as i32);
        if self.rank == root {
            let mut recvbuf = vec![0.0; local.len() * self.size];
            root_process.gather_into_root(local, &mut recvbuf[..]);
            Ok(Some(recvbuf))
        } else {
            root_process.gather_into(local);
            Ok(None)
        }
    }

    /// `MPI_Abort` on the world communicator.
    fn abort(&self, code: i32) -> ! {
        self.world.abort(code)
    }
}
