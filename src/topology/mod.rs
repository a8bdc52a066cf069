//! Top-level module for the process topology.
//!
//! Provides the 2D Cartesian arrangement of processes: grid factorization,
//! per-process coordinates, neighbor ranks and subdomain extents.

pub mod cartesian;

pub use cartesian::{CartesianTopology, Direction, Neighbors, dims_create};
