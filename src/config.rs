//! Run configuration.
//!
//! Defaults reproduce the classic setup: a 10×10 grid, conduction
//! coefficient 0.02, tolerance 1e-4 and at most 100 000 steps.

use serde::{Deserialize, Serialize};

use crate::algs::kernel::StencilParams;
use crate::data::scalar::Scalar;
use crate::stencil_error::StencilError;

pub const MIN_SIZE: usize = 2;
pub const DEFAULT_SIZE: usize = 10;
pub const DEFAULT_ALPHA: f64 = 0.02;
pub const DEFAULT_EPSILON: f64 = 0.0001;
pub const DEFAULT_MAX_STEPS: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StencilConfig {
    /// Edge length of the square global grid, border included.
    pub size: usize,
    pub alpha: f64,
    pub epsilon: f64,
    pub max_steps: usize,
    /// Worker threads per process for the local update.
    pub threads: usize,
}

impl Default for StencilConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            alpha: DEFAULT_ALPHA,
            epsilon: DEFAULT_EPSILON,
            max_steps: DEFAULT_MAX_STEPS,
            threads: default_threads(),
        }
    }
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Grid sizes below the minimum fall back to the default, with a warning.
pub fn clamp_size(size: usize) -> usize {
    if size < MIN_SIZE {
        log::warn!("Stencil size must be >= {MIN_SIZE}. Using default ({DEFAULT_SIZE}).");
        DEFAULT_SIZE
    } else {
        size
    }
}

impl StencilConfig {
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = clamp_size(size);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Coefficients converted to the sample type `T`.
    pub fn params<T: Scalar>(&self) -> Result<StencilParams<T>, StencilError> {
        let alpha = convert::<T>("alpha", self.alpha)?;
        let epsilon = convert::<T>("epsilon", self.epsilon)?;
        StencilParams::new(alpha, epsilon, self.max_steps)
    }
}

fn convert<T: Scalar>(name: &'static str, v: f64) -> Result<T, StencilError> {
    T::from(v).ok_or_else(|| StencilError::InvalidParameter {
        name,
        reason: format!("{v} is not representable"),
    })
}
