#![allow(dead_code)]
use heat_stencil::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub fn params(epsilon: f32, max_steps: usize) -> StencilParams<f32> {
    StencilParams::new(0.02, epsilon, max_steps).unwrap()
}

/// Default coefficients, as the binary uses them.
pub fn default_params() -> StencilParams<f32> {
    StencilConfig::default().params().unwrap()
}

/// Smallest square grid edge whose interior splits evenly over `nprocs`
/// processes, scaled by `k`.
pub fn square_size_for(nprocs: usize, k: usize) -> usize {
    let [gx, gy] = dims_create(nprocs).unwrap();
    gx * gy * k + 2
}

/// Field with a random border and interior, fixed seed.
pub fn random_field(size_x: usize, size_y: usize, seed: u64) -> GlobalField<f32> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let values = (0..size_x * size_y)
        .map(|_| rng.gen_range(-50.0f32..50.0))
        .collect();
    GlobalField::from_values(size_x, size_y, values).unwrap()
}

/// Copy of `field` with every interior cell set to zero.
pub fn without_interior(field: &GlobalField<f32>) -> GlobalField<f32> {
    let mut out = field.clone();
    for y in 1..field.size_y() - 1 {
        for x in 1..field.size_x() - 1 {
            out.set(x, y, 0.0);
        }
    }
    out
}

/// Every rank's topology for a group of `nprocs`.
pub fn all_topologies(nprocs: usize, size_x: usize, size_y: usize) -> Vec<CartesianTopology> {
    (0..nprocs)
        .map(|r| CartesianTopology::new(r, nprocs, size_x, size_y).unwrap())
        .collect()
}
