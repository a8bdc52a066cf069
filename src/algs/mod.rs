//! Re-export public algorithms.

pub mod communicator;
pub mod convergence;
pub mod distribute;
pub mod halo;
pub mod kernel;
pub mod wire;

pub use convergence::global_convergence;
pub use distribute::{collect, distribute};
pub use halo::HaloExchange;
pub use kernel::{StencilParams, update_parallel, update_serial};
