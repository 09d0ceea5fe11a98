//! Process-group communication.
//!
//! The `Comm` trait is the only way ranks interact: a paired send/receive for the halo
//! exchange, a barrier to fence timed regions, and a gather to the leader for the
//! final reduction. Backends:
//!
//! - [`MpiComm`] (feature `mpi`): one OS process per rank over the MPI world.
//! - [`ThreadComm`]: an in-process group, one thread per rank, for tests and for
//!   running several ranks on a workstation without an MPI launcher.
//! - [`SerialComm`]: a single rank with no peers.

use crate::error::{Result, StencilError};

pub trait Comm {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;
    fn barrier(&self);

    /// Paired exchange: send `send` to `dest` while receiving into `recv` from `source`.
    ///
    /// Both halves are one operation, so a chain of ranks that all call this
    /// cannot deadlock. `None` on either side turns that half into a no-op.
    fn send_recv(
        &self,
        send: &[f64],
        dest: Option<usize>,
        recv: &mut [f64],
        source: Option<usize>,
        tag: i32,
    ) -> Result<()>;

    /// Gather equally sized `local` slices on `root`, concatenated in rank order.
    /// Returns `None` on every other rank.
    fn gather(&self, local: &[f64], root: usize) -> Result<Option<Vec<f64>>>;

    /// Terminate the whole group.
    fn abort(&self, code: i32) -> ! {
        std::process::exit(code)
    }

    fn is_leader(&self) -> bool {
        self.rank() == 0
    }
}

#[cfg(feature = "mpi")]
pub mod mpi_comm;
#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;

pub mod thread_comm;
pub use thread_comm::ThreadComm;

/// Single-rank group.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialComm;

impl Comm for SerialComm {
    fn rank(&self) -> usize { 0 }
    fn size(&self) -> usize { 1 }
    fn barrier(&self) {}

    fn send_recv(
        &self,
        _send: &[f64],
        dest: Option<usize>,
        _recv: &mut [f64],
        source: Option<usize>,
        _tag: i32,
    ) -> Result<()> {
        match dest.or(source) {
            Some(peer) => Err(StencilError::Comm(format!("serial group has no rank {peer}"))),
            None => Ok(()),
        }
    }

    fn gather(&self, local: &[f64], root: usize) -> Result<Option<Vec<f64>>> {
        if root != 0 {
            return Err(StencilError::Comm(format!("gather root {root} outside serial group")));
        }
        Ok(Some(local.to_vec()))
    }
}

pub enum UniverseComm {
    #[cfg(feature = "mpi")]
    Mpi(MpiComm),
    Threads(ThreadComm),
    Serial(SerialComm),
}

impl Comm for UniverseComm {
    fn rank(&self) -> usize {
        match self {
            #[cfg(feature = "mpi")]
            UniverseComm::Mpi(comm) => comm.rank(),
            UniverseComm::Threads(comm) => comm.rank(),
            UniverseComm::Serial(comm) => comm.rank(),
        }
    }
    fn size(&self) -> usize {
        match self {
            #[cfg(feature = "mpi")]
            UniverseComm::Mpi(comm) => comm.size(),
            UniverseComm::Threads(comm) => comm.size(),
            UniverseComm::Serial(comm) => comm.size(),
        }
    }
    fn barrier(&self) {
        match self {
            #[cfg(feature = "mpi")]
            UniverseComm::Mpi(comm) => comm.barrier(),
            UniverseComm::Threads(comm) => comm.barrier(),
            UniverseComm::Serial(comm) => comm.barrier(),
        }
    }
    fn send_recv(
        &self,
        send: &[f64],
        dest: Option<usize>,
        recv: &mut [f64],
        source: Option<usize>,
        tag: i32,
    ) -> Result<()> {
        match self {
            #[cfg(feature = "mpi")]
            UniverseComm::Mpi(comm) => comm.send_recv(send, dest, recv, source, tag),
            UniverseComm::Threads(comm) => comm.send_recv(send, dest, recv, source, tag),
            UniverseComm::Serial(comm) => comm.send_recv(send, dest, recv, source, tag),
        }
    }
    fn gather(&self, local: &[f64], root: usize) -> Result<Option<Vec<f64>>> {
        match self {
            #[cfg(feature = "mpi")]
            UniverseComm::Mpi(comm) => comm.gather(local, root),
            UniverseComm::Threads(comm) => comm.gather(local, root),
            UniverseComm::Serial(comm) => comm.gather(local, root),
        }
    }
    fn abort(&self, code: i32) -> ! {
        match self {
            #[cfg(feature = "mpi")]
            UniverseComm::Mpi(comm) => comm.abort(code),
            UniverseComm::Threads(comm) => comm.abort(code),
            UniverseComm::Serial(comm) => comm.abort(code),
        }
    }
}
