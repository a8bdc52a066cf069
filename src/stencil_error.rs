//! StencilError: unified error type for heat-stencil public APIs.
//!
//! Every fallible operation in the crate returns this type. Communication
//! failures are fatal for the whole process group; callers are expected to
//! abort their communicator once they see one.

use std::fmt;
use thiserror::Error;

/// Cartesian axis of the process grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
        }
    }
}

/// Unified error type for heat-stencil operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StencilError {
    /// Global grid dimensions must leave room for the fixed border.
    #[error("grid size {size_x}x{size_y} is invalid: each dimension must be >= 2")]
    InvalidGridSize { size_x: usize, size_y: usize },
    /// A process group needs at least one member.
    #[error("process count must be >= 1, got {0}")]
    InvalidProcessCount(usize),
    /// The process grid factorization produced an empty axis.
    #[error("invalid process grid {gx}x{gy}")]
    InvalidProcessGrid { gx: usize, gy: usize },
    /// A rank outside `[0, size)` was addressed.
    #[error("rank {rank} out of range for a group of {size} processes")]
    RankOutOfRange { rank: usize, size: usize },
    /// The interior extent cannot be split evenly across the process grid.
    #[error(
        "interior extent {interior} along axis {axis} is not divisible by {parts} processes"
    )]
    UnevenDecomposition {
        axis: Axis,
        interior: usize,
        parts: usize,
    },
    /// A buffer did not have the length its layout requires.
    #[error("shape mismatch in {what}: expected {expected} elements, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A window reaches past the edge of the global field.
    #[error("window {w}x{h} at ({x0}, {y0}) exceeds the {size_x}x{size_y} field")]
    WindowOutOfBounds {
        x0: usize,
        y0: usize,
        w: usize,
        h: usize,
        size_x: usize,
        size_y: usize,
    },
    /// A send, receive or reduction failed.
    #[error("communication error with rank {neighbor}: {reason}")]
    CommError { neighbor: usize, reason: String },
    /// Another member of the process group aborted.
    #[error("process group aborted with code {0}")]
    Aborted(i32),
    /// The coordinator was started without the global field.
    #[error("coordinator rank {0} requires the global field before distribution")]
    MissingGlobalField(usize),
    /// A numeric parameter is unusable for the sample type.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    /// The worker pool for the local update could not be built.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

impl StencilError {
    /// Shorthand for a communication failure with `neighbor`.
    pub fn comm(neighbor: usize, reason: impl Into<String>) -> Self {
        StencilError::CommError {
            neighbor,
            reason: reason.into(),
        }
    }
}
