//! 5-point diffusion update over the interior of a halo-padded block.
//!
//! Every tier (sequential reference, shared-memory, hybrid) goes through
//! [`sweep_row`], so results are bitwise identical no matter how rows are
//! scheduled. Each output cell reads only the previous buffer, which makes
//! row order irrelevant; the per-row convergence flags are combined with an
//! order-independent AND that never short-circuits.

use rayon::prelude::*;

use crate::data::field::Extent;
use crate::data::scalar::Scalar;
use crate::stencil_error::StencilError;

/// Diffusion coefficient and convergence tolerance in sample precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StencilParams<T> {
    alpha: T,
    center: T,
    epsilon: T,
    max_steps: usize,
}

impl<T: Scalar> StencilParams<T> {
    pub fn new(alpha: T, epsilon: T, max_steps: usize) -> Result<Self, StencilError> {
        if !alpha.is_finite() {
            return Err(StencilError::InvalidParameter {
                name: "alpha",
                reason: format!("{alpha} is not finite"),
            });
        }
        if !epsilon.is_finite() || epsilon < T::zero() {
            return Err(StencilError::InvalidParameter {
                name: "epsilon",
                reason: format!("{epsilon} must be finite and >= 0"),
            });
        }
        let four = T::one() + T::one() + T::one() + T::one();
        Ok(Self {
            alpha,
            center: T::one() - four * alpha,
            epsilon,
            max_steps,
        })
    }

    #[inline]
    pub fn alpha(&self) -> T {
        self.alpha
    }

    #[inline]
    pub fn epsilon(&self) -> T {
        self.epsilon
    }

    #[inline]
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Same coefficients with a different step limit.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// Updates interior row `y` of `row` from `prev`; true if no cell moved by
/// more than epsilon.
#[inline]
fn sweep_row<T: Scalar>(
    prev: &[T],
    row: &mut [T],
    y: usize,
    e: Extent,
    k: &StencilParams<T>,
) -> bool {
    let s = e.stride();
    let mut converged = true;
    for x in 1..=e.nx {
        let i = x + s * y;
        let c = prev[i];
        let v = k.alpha * (prev[i - 1] + prev[i + 1] + prev[i - s] + prev[i + s]) + k.center * c;
        row[x] = v;
        if (c - v).abs() > k.epsilon {
            converged = false;
        }
    }
    converged
}

fn check_len<T>(prev: &[T], cur: &[T], e: Extent) -> Result<(), StencilError> {
    for (what, len) in [("previous buffer", prev.len()), ("current buffer", cur.len())] {
        if len != e.len() {
            return Err(StencilError::ShapeMismatch {
                what,
                expected: e.len(),
                actual: len,
            });
        }
    }
    Ok(())
}

/// Single-threaded sweep. Returns the local convergence flag.
pub fn update_serial<T: Scalar>(
    prev: &[T],
    cur: &mut [T],
    e: Extent,
    k: &StencilParams<T>,
) -> Result<bool, StencilError> {
    check_len(prev, cur, e)?;
    Ok(cur
        .chunks_exact_mut(e.stride())
        .enumerate()
        .skip(1)
        .take(e.ny)
        .map(|(y, row)| sweep_row(prev, row, y, e, k))
        .fold(true, |acc, c| acc & c))
}

/// Row-parallel sweep on the current rayon pool.
///
/// Returns only after every row is written, which is the barrier the halo
/// exchange relies on.
pub fn update_parallel<T: Scalar>(
    prev: &[T],
    cur: &mut [T],
    e: Extent,
    k: &StencilParams<T>,
) -> Result<bool, StencilError> {
    check_len(prev, cur, e)?;
    Ok(cur
        .par_chunks_exact_mut(e.stride())
        .enumerate()
        .skip(1)
        .take(e.ny)
        .map(|(y, row)| sweep_row(prev, row, y, e, k))
        .reduce(|| true, |a, b| a & b))
}
