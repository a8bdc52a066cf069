//! Hybrid solver: one [`HybridSolver`] per process, each running a rayon
//! pool for its local update and talking to its neighbors through a
//! [`Communicator`].
//!
//! The solver is the per-process context. Everything a step needs (the
//! topology, both buffers, the halo scratch lines and the worker pool) is
//! built once in [`HybridSolver::new`] and dropped with the solver.
//! [`HybridSolver::run`] drives the iteration:
//!
//! ```text
//! Init -> Distributing -> (Updating -> Exchanging -> Reducing)* -> Collecting -> Done
//! ```
//!
//! The update returns only after every worker has written its rows, and the
//! exchange runs on the calling thread alone, so no step's halo can overlap
//! the next step's sweep.

use std::time::Instant;

use crate::algs::communicator::{COORDINATOR, CommTag, Communicator};
use crate::algs::convergence::global_convergence;
use crate::algs::distribute::{collect, distribute};
use crate::algs::halo::HaloExchange;
use crate::algs::kernel::{StencilParams, update_parallel};
use crate::data::field::GlobalField;
use crate::data::scalar::Scalar;
use crate::data::subdomain::DoubleBuffer;
use crate::report::{RunReport, Termination};
use crate::stencil_error::StencilError;
use crate::topology::cartesian::CartesianTopology;

/// Abort code used when a process fails mid-run.
pub const FAILURE_CODE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Init,
    Distributing,
    Updating,
    Exchanging,
    Reducing,
    Collecting,
    Done,
}

impl Phase {
    /// Whether `next` may follow `self`.
    pub fn can_advance_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Init, Distributing)
                | (Distributing, Updating)
                | (Distributing, Collecting)
                | (Updating, Exchanging)
                | (Exchanging, Reducing)
                | (Reducing, Updating)
                | (Reducing, Collecting)
                | (Collecting, Done)
        )
    }
}

/// Message tags used by one run. Distinct runs on the same communicator
/// should use disjoint tag ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilTags {
    pub scatter: CommTag,
    pub gather: CommTag,
    /// Base of four consecutive halo tags.
    pub halo: CommTag,
    /// Base of two consecutive reduction tags.
    pub reduce: CommTag,
}

impl StencilTags {
    pub const fn from_base(base: CommTag) -> Self {
        Self {
            scatter: base,
            gather: base.offset(1),
            halo: base.offset(2),
            reduce: base.offset(6),
        }
    }
}

impl Default for StencilTags {
    fn default() -> Self {
        Self::from_base(CommTag::new(0x5100))
    }
}

/// What a process holds after `run`.
#[derive(Debug, Clone)]
pub struct HybridOutcome<T> {
    /// The collected global field; `Some` on the coordinator only.
    pub field: Option<GlobalField<T>>,
    pub report: RunReport,
}

pub struct HybridSolver<'c, T, C: Communicator> {
    comm: &'c C,
    topo: CartesianTopology,
    params: StencilParams<T>,
    buffers: DoubleBuffer<T>,
    halo: HaloExchange<T>,
    pool: rayon::ThreadPool,
    tags: StencilTags,
    phase: Phase,
}

impl<'c, T: Scalar, C: Communicator> HybridSolver<'c, T, C> {
    /// Builds the per-process context for a `size_x`×`size_y` global grid.
    pub fn new(
        comm: &'c C,
        size_x: usize,
        size_y: usize,
        params: StencilParams<T>,
        threads: usize,
    ) -> Result<Self, StencilError> {
        let topo = CartesianTopology::new(comm.rank(), comm.size(), size_x, size_y)?;
        let e = topo.local_extent();
        let tags = StencilTags::default();
        Ok(Self {
            comm,
            buffers: DoubleBuffer::new(e),
            halo: HaloExchange::new(e, topo.neighbors(), tags.halo),
            pool: super::build_pool(threads)?,
            topo,
            params,
            tags,
            phase: Phase::Init,
        })
    }

    pub fn with_tags(mut self, tags: StencilTags) -> Self {
        self.halo = HaloExchange::new(self.topo.local_extent(), self.topo.neighbors(), tags.halo);
        self.tags = tags;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn topology(&self) -> &CartesianTopology {
        &self.topo
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal transition {:?} -> {next:?}",
            self.phase
        );
        if !matches!(next, Phase::Updating | Phase::Exchanging | Phase::Reducing) {
            log::debug!("rank {}: {:?} -> {next:?}", self.topo.rank(), self.phase);
        }
        self.phase = next;
    }

    /// Runs the solver to completion.
    ///
    /// The coordinator passes the initial global field and gets the final one
    /// back; other processes pass `None`. On failure the whole process group
    /// is aborted before the error is returned.
    pub fn run(mut self, global: Option<GlobalField<T>>) -> Result<HybridOutcome<T>, StencilError> {
        match self.iterate(global) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                if !matches!(err, StencilError::Aborted(_)) {
                    log::error!("rank {} failed in {:?}: {err}", self.topo.rank(), self.phase);
                    self.comm.abort(FAILURE_CODE);
                }
                Err(err)
            }
        }
    }

    fn iterate(&mut self, global: Option<GlobalField<T>>) -> Result<HybridOutcome<T>, StencilError> {
        let rank = self.topo.rank();
        // Only the coordinator keeps the field; it stays untouched until collection.
        let mut global = if rank == COORDINATOR { global } else { None };
        let started = Instant::now();

        self.advance(Phase::Distributing);
        distribute(self.comm, &self.topo, global.as_ref(), &mut self.buffers, self.tags.scatter)?;

        let mut steps = 0;
        let mut termination = Termination::StepLimit;
        while steps < self.params.max_steps() {
            self.advance(Phase::Updating);
            let local = self.update()?;

            self.advance(Phase::Exchanging);
            self.halo.exchange(self.comm, self.buffers.current_mut())?;

            self.advance(Phase::Reducing);
            let converged = global_convergence(self.comm, local, self.tags.reduce)?;
            steps += 1;
            log::trace!("rank {rank}: step {steps}, local {local}, global {converged}");
            if converged {
                termination = Termination::Converged;
                break;
            }
        }

        self.advance(Phase::Collecting);
        collect(self.comm, &self.topo, &self.buffers, global.as_mut(), self.tags.gather)?;
        let elapsed = started.elapsed();
        self.advance(Phase::Done);

        if rank == COORDINATOR {
            log::info!("{termination:?} after {steps} steps");
        }
        let [size_x, size_y] = self.topo.global_size();
        Ok(HybridOutcome {
            field: global,
            report: RunReport {
                size_x,
                size_y,
                steps,
                termination,
                elapsed,
                processes: self.topo.nprocs(),
                threads: self.threads(),
            },
        })
    }

    /// One sweep over the local interior on the worker pool.
    fn update(&mut self) -> Result<bool, StencilError> {
        self.buffers.swap();
        let e = self.buffers.extent();
        let params = &self.params;
        let (prev, cur) = self.buffers.split();
        self.pool.install(|| update_parallel(prev, cur, e, params))
    }
}

impl<T, C: Communicator> std::fmt::Debug for HybridSolver<'_, T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridSolver")
            .field("topology", &self.topo)
            .field("tags", &self.tags)
            .field("phase", &self.phase)
            .finish()
    }
}
