//! Scatter the global field into per-process subdomains, and gather the
//! interiors back.
//!
//! Only the coordinator ever holds the global field. During distribution it
//! walks the ranks in ascending order, cuts each rank's halo-inclusive
//! window out of the field and ships it; the other ranks block on the
//! matching receive. Collection is the inverse, except that only interiors
//! travel: the coordinator's field still carries the fixed border.

use crate::algs::communicator::{COORDINATOR, CommTag, Communicator};
use crate::algs::wire::{cast_slice, cast_slice_mut};
use crate::data::field::GlobalField;
use crate::data::scalar::Scalar;
use crate::data::subdomain::DoubleBuffer;
use crate::stencil_error::StencilError;
use crate::topology::cartesian::CartesianTopology;

fn check_group<C: Communicator>(comm: &C, topo: &CartesianTopology) -> Result<(), StencilError> {
    if comm.size() != topo.nprocs() {
        return Err(StencilError::ShapeMismatch {
            what: "process group",
            expected: topo.nprocs(),
            actual: comm.size(),
        });
    }
    if comm.rank() != topo.rank() {
        return Err(StencilError::RankOutOfRange {
            rank: comm.rank(),
            size: topo.nprocs(),
        });
    }
    Ok(())
}

fn coordinator_field<'a, T: Scalar>(
    topo: &CartesianTopology,
    field: Option<&'a GlobalField<T>>,
) -> Result<&'a GlobalField<T>, StencilError> {
    let field = field.ok_or(StencilError::MissingGlobalField(COORDINATOR))?;
    let [sx, sy] = topo.global_size();
    if field.size_x() != sx || field.size_y() != sy {
        return Err(StencilError::ShapeMismatch {
            what: "global field",
            expected: sx * sy,
            actual: field.size_x() * field.size_y(),
        });
    }
    Ok(field)
}

/// Seeds both slots of `buffers` with this rank's initial window.
///
/// `global` is required on the coordinator and ignored elsewhere.
pub fn distribute<T, C>(
    comm: &C,
    topo: &CartesianTopology,
    global: Option<&GlobalField<T>>,
    buffers: &mut DoubleBuffer<T>,
    tag: CommTag,
) -> Result<(), StencilError>
where
    T: Scalar,
    C: Communicator,
{
    check_group(comm, topo)?;
    let e = topo.local_extent();
    let mut window = vec![T::zero(); e.len()];
    if comm.rank() == COORDINATOR {
        let field = coordinator_field(topo, global)?;
        for r in 0..topo.nprocs() {
            let [x0, y0] = topo.origin_of(r)?;
            field.copy_window(x0, y0, e.stride(), e.rows(), &mut window)?;
            if r == COORDINATOR {
                buffers.seed(&window)?;
            } else {
                comm.send(r, tag.as_u16(), cast_slice(&window))?;
            }
        }
        log::debug!("distributed {} windows of {}x{}", topo.nprocs(), e.stride(), e.rows());
    } else {
        comm.recv_into(COORDINATOR, tag.as_u16(), cast_slice_mut(&mut window))?;
        buffers.seed(&window)?;
    }
    Ok(())
}

/// Writes every rank's interior (current slot) back into the coordinator's
/// field. Every rank sends exactly once.
pub fn collect<T, C>(
    comm: &C,
    topo: &CartesianTopology,
    buffers: &DoubleBuffer<T>,
    global: Option<&mut GlobalField<T>>,
    tag: CommTag,
) -> Result<(), StencilError>
where
    T: Scalar,
    C: Communicator,
{
    check_group(comm, topo)?;
    let e = topo.local_extent();
    let mut block = vec![T::zero(); e.interior_len()];
    if comm.rank() == COORDINATOR {
        let field = global.ok_or(StencilError::MissingGlobalField(COORDINATOR))?;
        coordinator_field(topo, Some(&*field))?;
        for r in 0..topo.nprocs() {
            if r == COORDINATOR {
                buffers.pack_interior(&mut block)?;
            } else {
                comm.recv_into(r, tag.as_u16(), cast_slice_mut(&mut block))?;
            }
            let [x0, y0] = topo.origin_of(r)?;
            field.write_window(x0 + 1, y0 + 1, e.nx, e.ny, &block)?;
        }
        log::debug!("collected {} interiors of {}x{}", topo.nprocs(), e.nx, e.ny);
    } else {
        buffers.pack_interior(&mut block)?;
        comm.send(COORDINATOR, tag.as_u16(), cast_slice(&block))?;
    }
    Ok(())
}
