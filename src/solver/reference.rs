//! Single-process solvers: the sequential baseline and a rayon-parallel
//! variant over the same double buffer.

use std::time::Instant;

use crate::algs::kernel::{StencilParams, update_parallel, update_serial};
use crate::data::field::{Extent, GlobalField};
use crate::data::scalar::Scalar;
use crate::data::subdomain::DoubleBuffer;
use crate::report::{RunReport, Termination};
use crate::stencil_error::StencilError;

/// Final field plus run statistics.
#[derive(Debug, Clone)]
pub struct Solution<T> {
    pub field: GlobalField<T>,
    pub report: RunReport,
}

fn iterate<T, F>(
    field: GlobalField<T>,
    params: &StencilParams<T>,
    threads: usize,
    mut sweep: F,
) -> Result<Solution<T>, StencilError>
where
    T: Scalar,
    F: FnMut(&[T], &mut [T], Extent) -> Result<bool, StencilError>,
{
    // The whole field is one subdomain whose halo is the fixed border.
    let e = field.extent();
    let mut buffers = DoubleBuffer::new(e);
    buffers.seed(field.values())?;

    let started = Instant::now();
    let mut steps = 0;
    let mut termination = Termination::StepLimit;
    while steps < params.max_steps() {
        buffers.swap();
        let (prev, cur) = buffers.split();
        let converged = sweep(prev, cur, e)?;
        steps += 1;
        log::trace!("step {steps}: converged {converged}");
        if converged {
            termination = Termination::Converged;
            break;
        }
    }
    let elapsed = started.elapsed();

    let (size_x, size_y) = (field.size_x(), field.size_y());
    let field = GlobalField::from_values(size_x, size_y, buffers.current().to_vec())?;
    log::info!("{termination:?} after {steps} steps");
    Ok(Solution {
        field,
        report: RunReport {
            size_x,
            size_y,
            steps,
            termination,
            elapsed,
            processes: 1,
            threads,
        },
    })
}

/// Sequential reference solver. Every other variant is checked against it.
pub fn solve_sequential<T: Scalar>(
    field: GlobalField<T>,
    params: &StencilParams<T>,
) -> Result<Solution<T>, StencilError> {
    iterate(field, params, 1, |prev, cur, e| update_serial(prev, cur, e, params))
}

/// Shared-memory solver: one process, the sweep split over `threads`
/// rayon workers.
pub fn solve_shared<T: Scalar>(
    field: GlobalField<T>,
    params: &StencilParams<T>,
    threads: usize,
) -> Result<Solution<T>, StencilError> {
    let pool = super::build_pool(threads)?;
    iterate(field, params, pool.current_num_threads(), |prev, cur, e| {
        pool.install(|| update_parallel(prev, cur, e, params))
    })
}
