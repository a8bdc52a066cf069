//! Bound alias for grid samples.
//!
//! The blanket impl means any float that is plain-old-data qualifies
//! (`f32` and `f64` in practice). It only reduces duplication in `where`
//! clauses.

use bytemuck::Pod;
use num_traits::Float;
use std::fmt::{Debug, Display};

/// Canonical bound set for field samples.
///
/// - `Float` for the weighted average and the convergence test
/// - `Pod` so slices can go on the wire without copying element by element
/// - `Send + Sync` so rayon workers can share the read-only buffer
/// - `Debug + Display` for grid dumps and mismatch reports
pub trait Scalar: Float + Pod + Send + Sync + Debug + Display + 'static {}
impl<T> Scalar for T where T: Float + Pod + Send + Sync + Debug + Display + 'static {}

/// Converts a `usize` coordinate into a sample value (ramp initialization).
#[inline]
pub(crate) fn from_index<T: Scalar>(i: usize) -> T {
    // every Float can hold a grid coordinate, possibly rounded
    T::from(i).unwrap_or_else(T::infinity)
}
