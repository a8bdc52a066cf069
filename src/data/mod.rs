//! Data module: global field, halo-padded subdomains and sample bounds

pub mod field;
pub mod scalar;
pub mod subdomain;

pub use field::{Extent, GlobalField};
pub use scalar::Scalar;
pub use subdomain::DoubleBuffer;
