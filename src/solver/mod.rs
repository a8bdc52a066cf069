//! Solver variants: the sequential reference, the single-process
//! shared-memory solver and the hybrid multi-process solver.

pub mod hybrid;
pub mod launch;
pub mod reference;

pub use hybrid::{HybridOutcome, HybridSolver, Phase, StencilTags};
pub use launch::{run_local_ranks, solve_hybrid_local};
pub use reference::{Solution, solve_sequential, solve_shared};

use crate::stencil_error::StencilError;

/// Worker pool for one process's local update.
pub(crate) fn build_pool(threads: usize) -> Result<rayon::ThreadPool, StencilError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|i| format!("stencil-worker-{i}"))
        .build()
        .map_err(|e| StencilError::ThreadPool(e.to_string()))
}
