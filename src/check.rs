//! Self-check: rerun the problem on the sequential reference and diff the
//! result cell by cell.

use std::fmt;

use itertools::iproduct;

use crate::algs::kernel::StencilParams;
use crate::data::field::GlobalField;
use crate::data::scalar::Scalar;
use crate::solver::reference::solve_sequential;
use crate::stencil_error::StencilError;

/// One cell where the candidate strays from the reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch<T> {
    pub x: usize,
    pub y: usize,
    pub expected: T,
    pub actual: T,
}

impl<T: Scalar> fmt::Display for Mismatch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mismatch at ({}, {}): seq = {}, test = {}",
            self.x, self.y, self.expected, self.actual
        )
    }
}

/// Every cell of `candidate` differing from `reference` by more than
/// `tolerance`, in column-major order.
pub fn compare<T: Scalar>(
    reference: &GlobalField<T>,
    candidate: &GlobalField<T>,
    tolerance: T,
) -> Result<Vec<Mismatch<T>>, StencilError> {
    if reference.size_x() != candidate.size_x() || reference.size_y() != candidate.size_y() {
        return Err(StencilError::ShapeMismatch {
            what: "compared field",
            expected: reference.values().len(),
            actual: candidate.values().len(),
        });
    }
    Ok(iproduct!(0..reference.size_x(), 0..reference.size_y())
        .filter_map(|(x, y)| {
            let (expected, actual) = (reference.get(x, y), candidate.get(x, y));
            let diff = (expected - actual).abs();
            (diff > tolerance || diff.is_nan()).then_some(Mismatch {
                x,
                y,
                expected,
                actual,
            })
        })
        .collect())
}

#[derive(Debug, Clone)]
pub struct CheckReport<T> {
    pub mismatches: Vec<Mismatch<T>>,
    /// The reference result.
    pub expected: GlobalField<T>,
}

impl<T> CheckReport<T> {
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }
}

impl<T: Scalar> fmt::Display for CheckReport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.mismatches {
            writeln!(f, "{m}")?;
        }
        if self.is_match() {
            writeln!(f, "Results match perfectly.")
        } else {
            writeln!(f, "Results do not match! Expected:")?;
            write!(f, "{}", self.expected)
        }
    }
}

/// Solves the ramp problem of `candidate`'s size sequentially and compares,
/// using the convergence tolerance as the cell tolerance.
pub fn self_check<T: Scalar>(
    candidate: &GlobalField<T>,
    params: &StencilParams<T>,
) -> Result<CheckReport<T>, StencilError> {
    let init = GlobalField::ramp(candidate.size_x(), candidate.size_y())?;
    let expected = solve_sequential(init, params)?.field;
    let mismatches = compare(&expected, candidate, params.epsilon())?;
    if !mismatches.is_empty() {
        log::warn!("self-check found {} mismatched cells", mismatches.len());
    }
    Ok(CheckReport {
        mismatches,
        expected,
    })
}
