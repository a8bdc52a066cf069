#![cfg_attr(docsrs, feature(doc_cfg))]
//! # heat-stencil
//!
//! heat-stencil solves 2D steady-state heat diffusion with a 5-point Jacobi
//! stencil on a rectangular grid with fixed boundary values. The grid is
//! block-decomposed over a Cartesian grid of processes; each process updates
//! its subdomain with a pool of worker threads and trades one-cell halos with
//! its four neighbors after every step. Iteration stops once every process
//! sees every interior cell change by at most `epsilon`, or at a step limit.
//!
//! ## Features
//! - Pluggable communication backends (single process, threads, MPI) behind
//!   the [`Communicator`](algs::communicator::Communicator) trait
//! - Sequential, shared-memory and hybrid solvers sharing one row kernel, so
//!   every variant produces bitwise identical fields
//! - Self-check against the sequential reference
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! heat-stencil = "0.3"
//! # Optional features:
//! # features = ["mpi-support"]
//! ```
//!
//! ```no_run
//! use heat_stencil::prelude::*;
//!
//! # fn main() -> Result<(), StencilError> {
//! let params = StencilConfig::default().params::<f32>()?;
//! let field = GlobalField::ramp(10, 10)?;
//! let outcome = solve_hybrid_local(field, &params, 4, 2)?;
//! println!("{}", outcome.report);
//! # Ok(())
//! # }
//! ```

pub mod algs;
pub mod check;
pub mod config;
pub mod data;
pub mod report;
pub mod solver;
pub mod stencil_error;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{CommTag, Communicator, NoComm, ThreadComm};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::kernel::StencilParams;
    pub use crate::check::{CheckReport, Mismatch, self_check};
    pub use crate::config::StencilConfig;
    pub use crate::data::field::{Extent, GlobalField};
    pub use crate::data::scalar::Scalar;
    pub use crate::data::subdomain::DoubleBuffer;
    pub use crate::report::{RunReport, Termination};
    pub use crate::solver::{
        HybridOutcome, HybridSolver, Phase, Solution, run_local_ranks, solve_hybrid_local,
        solve_sequential, solve_shared,
    };
    pub use crate::stencil_error::StencilError;
    pub use crate::topology::cartesian::{CartesianTopology, Direction, Neighbors, dims_create};
}
