//! Fixed little-endian wire records and byte-view helpers.
//!
//! Sample buffers travel as raw bytes of their `Pod` representation. Bytes
//! are always copied *into* a typed destination, never reinterpreted in
//! place, so a received `Vec<u8>` never has to be aligned for `T`.

use bytemuck::{Pod, Zeroable};
use static_assertions::assert_eq_size;

use crate::stencil_error::StencilError;

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

pub fn expect_exact_len(peer: usize, actual: usize, expected: usize) -> Result<(), StencilError> {
    if actual == expected {
        Ok(())
    } else {
        Err(StencilError::comm(
            peer,
            format!("expected {expected} bytes, got {actual}"),
        ))
    }
}

/// Copies a received message into a typed buffer after checking its length.
pub fn copy_into<T: Pod>(peer: usize, bytes: &[u8], dst: &mut [T]) -> Result<(), StencilError> {
    let view = cast_slice_mut(dst);
    expect_exact_len(peer, bytes.len(), view.len())?;
    view.copy_from_slice(bytes);
    Ok(())
}

/// A boolean carried on the wire (convergence votes).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct WireFlag {
    pub v_le: u32,
}

assert_eq_size!(WireFlag, u32);

impl WireFlag {
    pub fn new(b: bool) -> Self {
        Self {
            v_le: u32::from(b).to_le(),
        }
    }
    pub fn get(&self) -> bool {
        u32::from_le(self.v_le) != 0
    }
}
