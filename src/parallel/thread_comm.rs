//! In-process process group: one OS thread per rank.
//!
//! Each rank owns an unbounded `crossbeam-channel` inbox and holds a sender to every
//! other rank's inbox. Sends never block, so `send_recv` is simply post-then-take.
//! Messages that arrive ahead of the matching receive wait in a per-rank mailbox
//! keyed by `(source, tag)`, which gives MPI-like matching for the halo tags and the
//! gather.
//!
//! The barrier is a shared `std::sync::Barrier`. A rank that panics leaves its
//! peers blocked, the same way a dead MPI process stalls a job.

use std::cell::RefCell;
use std::sync::{Arc, Barrier};

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Comm;
use crate::error::{Result, StencilError};

/// Reserved tag for the gather collective; halo tags are non-negative.
const GATHER_TAG: i32 = -1;

struct Envelope {
    source: usize,
    tag: i32,
    payload: Vec<f64>,
}

pub struct ThreadComm {
    rank: usize,
    size: usize,
    outboxes: Vec<Sender<Envelope>>,
    inbox: Receiver<Envelope>,
    mailbox: RefCell<Vec<Envelope>>,
    barrier: Arc<Barrier>,
}

impl ThreadComm {
    /// Build `size` fully connected endpoints, one per rank.
    pub fn group(size: usize) -> Vec<ThreadComm> {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| unbounded()).unzip();
        let barrier = Arc::new(Barrier::new(size.max(1)));
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| ThreadComm {
                rank,
                size,
                outboxes: senders.clone(),
                inbox,
                mailbox: RefCell::new(Vec::new()),
                barrier: Arc::clone(&barrier),
            })
            .collect()
    }

    /// Run `f` once per rank on its own thread and collect the results in rank order.
    ///
    /// A panic on any rank is re-raised on the caller once the group is joined.
    pub fn run_group<F, R>(size: usize, f: F) -> Vec<R>
    where
        F: Fn(ThreadComm) -> R + Sync,
        R: Send,
    {
        let f = &f;
        std::thread::scope(|s| {
            let handles: Vec<_> = ThreadComm::group(size)
                .into_iter()
                .map(|comm| {
                    std::thread::Builder::new()
                        .name(format!("rank-{}", comm.rank))
                        .spawn_scoped(s, move || f(comm))
                        .unwrap_or_else(|e| panic!("failed to spawn rank thread: {e}"))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        })
    }

    fn post(&self, dest: usize, tag: i32, payload: &[f64]) -> Result<()> {
        let outbox = self.outboxes.get(dest).ok_or_else(|| {
            StencilError::Comm(format!("no rank {dest} in group of {}", self.size))
        })?;
        outbox
            .send(Envelope { source: self.rank, tag, payload: payload.to_vec() })
            .map_err(|_| StencilError::Comm(format!("rank {dest} has left the group")))
    }

    /// Block until a message from `source` with `tag` is available.
    fn take(&self, source: usize, tag: i32) -> Result<Vec<f64>> {
        {
            let mut mailbox = self.mailbox.borrow_mut();
            if let Some(pos) = mailbox.iter().position(|m| m.source == source && m.tag == tag) {
                return Ok(mailbox.remove(pos).payload);
            }
        }
        loop {
            let msg = self
                .inbox
                .recv()
                .map_err(|_| StencilError::Comm(format!("rank {} inbox disconnected", self.rank)))?;
            if msg.source == source && msg.tag == tag {
                return Ok(msg.payload);
            }
            self.mailbox.borrow_mut().push(msg);
        }
    }
}

impl Comm for ThreadComm {
    fn rank(&self) -> usize { self.rank }
    fn size(&self) -> usize { self.size }
    fn barrier(&self) { self.barrier.wait(); }

    fn send_recv(
        &self,
        send: &[f64],
        dest: Option<usize>,
        recv: &mut [f64],
        source: Option<usize>,
        tag: i32,
    ) -> Result<()> {
        if let Some(dest) = dest {
            self.post(dest, tag, send)?;
        }
        if let Some(source) = source {
            let payload = self.take(source, tag)?;
            if payload.len() != recv.len() {
                return Err(StencilError::Comm(format!(
                    "rank {} expected {} values from rank {source}, got {}",
                    self.rank,
                    recv.len(),
                    payload.len()
                )));
            }
            recv.copy_from_slice(&payload);
        }
        Ok(())
    }

    fn gather(&self, local: &[f64], root: usize) -> Result<Option<Vec<f64>>> {
        if self.rank != root {
            self.post(root, GATHER_TAG, local)?;
            return Ok(None);
        }
        let mut out = Vec::with_capacity(local.len() * self.size);
        for source in 0..self.size {
            if source == root {
                out.extend_from_slice(local);
                continue;
            }
            let payload = self.take(source, GATHER_TAG)?;
            if payload.len() != local.len() {
                return Err(StencilError::Comm(format!(
                    "gather: rank {source} sent {} values, expected {}",
                    payload.len(),
                    local.len()
                )));
            }
            out.extend_from_slice(&payload);
        }
        Ok(Some(out))
    }
}
