//! Runs a group of simulated processes as threads of this process.

use std::thread;

use parking_lot::Mutex;

use crate::algs::communicator::{COORDINATOR, Communicator, ThreadComm};
use crate::algs::kernel::StencilParams;
use crate::data::field::GlobalField;
use crate::data::scalar::Scalar;
use crate::solver::hybrid::{FAILURE_CODE, HybridOutcome, HybridSolver};
use crate::stencil_error::StencilError;

/// Spawns `nprocs` ranks over a fresh [`ThreadComm`] universe and runs `f`
/// on each. Results come back in rank order.
///
/// A rank that errors or panics aborts the group, so no peer is left
/// blocked on it.
pub fn run_local_ranks<R, F>(nprocs: usize, f: F) -> Result<Vec<Result<R, StencilError>>, StencilError>
where
    R: Send,
    F: Fn(&ThreadComm) -> Result<R, StencilError> + Sync,
{
    if nprocs == 0 {
        return Err(StencilError::InvalidProcessCount(0));
    }
    let comms = ThreadComm::universe(nprocs);
    let f = &f;
    thread::scope(|s| {
        let mut handles = Vec::with_capacity(nprocs);
        for comm in &comms {
            let spawned = thread::Builder::new()
                .name(format!("rank-{}", comm.rank()))
                .spawn_scoped(s, move || {
                    let out = f(comm);
                    if let Err(err) = &out {
                        if !matches!(err, StencilError::Aborted(_)) {
                            comm.abort(FAILURE_CODE);
                        }
                    }
                    out
                });
            match spawned {
                Ok(h) => handles.push(h),
                Err(e) => {
                    // ranks already running would wait forever on the missing one
                    comm.abort(FAILURE_CODE);
                    return Err(StencilError::ThreadPool(e.to_string()));
                }
            }
        }
        Ok(handles
            .into_iter()
            .zip(&comms)
            .map(|(h, comm)| {
                h.join().unwrap_or_else(|_| {
                    comm.abort(FAILURE_CODE);
                    Err(StencilError::comm(comm.rank(), "rank thread panicked"))
                })
            })
            .collect())
    })
}

/// Solves `field` with the hybrid solver on `nprocs` simulated processes of
/// `threads` workers each, returning the coordinator's outcome.
///
/// If any rank fails, the first failure that is not a mere consequence of
/// the group being aborted is returned.
pub fn solve_hybrid_local<T: Scalar>(
    field: GlobalField<T>,
    params: &StencilParams<T>,
    nprocs: usize,
    threads: usize,
) -> Result<HybridOutcome<T>, StencilError> {
    let (size_x, size_y) = (field.size_x(), field.size_y());
    let field = Mutex::new(Some(field));
    let results = run_local_ranks(nprocs, |comm| {
        let solver = HybridSolver::new(comm, size_x, size_y, *params, threads)?;
        let global = if comm.rank() == COORDINATOR {
            field.lock().take()
        } else {
            None
        };
        solver.run(global)
    })?;

    let mut coordinator = None;
    let mut first_abort = None;
    for (rank, result) in results.into_iter().enumerate() {
        match result {
            Ok(outcome) if rank == COORDINATOR => coordinator = Some(outcome),
            Ok(_) => {}
            Err(err @ StencilError::Aborted(_)) => {
                first_abort.get_or_insert(err);
            }
            Err(err) => return Err(err),
        }
    }
    match (coordinator, first_abort) {
        (_, Some(err)) => Err(err),
        (Some(outcome), None) => Ok(outcome),
        (None, None) => Err(StencilError::MissingGlobalField(COORDINATOR)),
    }
}
