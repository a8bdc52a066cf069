//! Global and local coordinate spaces.
//!
//! Both the global field and every local subdomain are stored row-major
//! with `x` varying fastest: the sample at `(x, y)` lives at
//! `x + stride * y`. A subdomain with an `nx × ny` interior has a one-cell
//! halo ring on every side, so its stride is `nx + 2`. The global field is
//! the same shape with its fixed border playing the role of the halo.

use std::fmt;

use crate::data::scalar::{Scalar, from_index};
use crate::stencil_error::StencilError;

/// Interior dimensions of a halo-padded block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Extent {
    /// Interior width (halo excluded).
    pub nx: usize,
    /// Interior height (halo excluded).
    pub ny: usize,
}

impl Extent {
    pub const fn new(nx: usize, ny: usize) -> Self {
        Self { nx, ny }
    }

    /// Row length including the halo ring.
    #[inline]
    pub const fn stride(&self) -> usize {
        self.nx + 2
    }

    /// Number of rows including the halo ring.
    #[inline]
    pub const fn rows(&self) -> usize {
        self.ny + 2
    }

    /// Total sample count including the halo ring.
    #[inline]
    pub const fn len(&self) -> usize {
        self.stride() * self.rows()
    }

    /// Number of interior samples.
    #[inline]
    pub const fn interior_len(&self) -> usize {
        self.nx * self.ny
    }

    /// Halo-inclusive linear index of `(x, y)`; `(1, 1)` is the first interior cell.
    #[inline]
    pub const fn idx(&self, x: usize, y: usize) -> usize {
        x + self.stride() * y
    }
}

/// The full problem grid, owned by the coordinator only.
#[derive(Clone, PartialEq)]
pub struct GlobalField<T> {
    size_x: usize,
    size_y: usize,
    values: Vec<T>,
}

impl<T: Scalar> GlobalField<T> {
    fn check_size(size_x: usize, size_y: usize) -> Result<(), StencilError> {
        if size_x < 2 || size_y < 2 {
            return Err(StencilError::InvalidGridSize { size_x, size_y });
        }
        Ok(())
    }

    /// All-zero field, border included.
    pub fn zeroed(size_x: usize, size_y: usize) -> Result<Self, StencilError> {
        Self::check_size(size_x, size_y)?;
        Ok(Self {
            size_x,
            size_y,
            values: vec![T::zero(); size_x * size_y],
        })
    }

    /// Initial condition: zero interior, linear ramps on the border.
    ///
    /// Top row counts up along x, bottom row counts down, left column counts
    /// up along y, right column counts down. The columns are written last so
    /// they own the corners.
    pub fn ramp(size_x: usize, size_y: usize) -> Result<Self, StencilError> {
        let mut field = Self::zeroed(size_x, size_y)?;
        for x in 0..size_x {
            field.set(x, 0, from_index(x));
            field.set(x, size_y - 1, from_index(size_x - 1 - x));
        }
        for y in 0..size_y {
            field.set(0, y, from_index(y));
            field.set(size_x - 1, y, from_index(size_y - 1 - y));
        }
        Ok(field)
    }

    /// Wraps existing row-major samples.
    pub fn from_values(size_x: usize, size_y: usize, values: Vec<T>) -> Result<Self, StencilError> {
        Self::check_size(size_x, size_y)?;
        if values.len() != size_x * size_y {
            return Err(StencilError::ShapeMismatch {
                what: "global field",
                expected: size_x * size_y,
                actual: values.len(),
            });
        }
        Ok(Self {
            size_x,
            size_y,
            values,
        })
    }

    #[inline]
    pub fn size_x(&self) -> usize {
        self.size_x
    }

    #[inline]
    pub fn size_y(&self) -> usize {
        self.size_y
    }

    /// The global grid seen as one halo-padded block.
    #[inline]
    pub fn extent(&self) -> Extent {
        Extent::new(self.size_x - 2, self.size_y - 2)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.values[x + self.size_x * y]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: T) {
        self.values[x + self.size_x * y] = v;
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    /// Coordinates of every border cell, each visited once.
    pub fn border_coords(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (sx, sy) = (self.size_x, self.size_y);
        (0..sy).flat_map(move |y| {
            (0..sx).filter_map(move |x| {
                (x == 0 || y == 0 || x == sx - 1 || y == sy - 1).then_some((x, y))
            })
        })
    }

    /// True when both fields carry bitwise-identical border samples.
    pub fn border_eq(&self, other: &Self) -> bool {
        self.size_x == other.size_x
            && self.size_y == other.size_y
            && self
                .border_coords()
                .all(|(x, y)| bits_eq(self.get(x, y), other.get(x, y)))
    }

    /// True when every sample, border and interior, is bitwise identical.
    pub fn bitwise_eq(&self, other: &Self) -> bool {
        self.size_x == other.size_x
            && self.size_y == other.size_y
            && bytemuck::cast_slice::<T, u8>(&self.values)
                == bytemuck::cast_slice::<T, u8>(&other.values)
    }

    /// Copies the `w × h` window whose top-left corner is `(x0, y0)` into `out`.
    pub fn copy_window(
        &self,
        x0: usize,
        y0: usize,
        w: usize,
        h: usize,
        out: &mut [T],
    ) -> Result<(), StencilError> {
        self.check_window(x0, y0, w, h, out.len())?;
        for (dy, row) in out.chunks_exact_mut(w.max(1)).take(h).enumerate() {
            let start = x0 + self.size_x * (y0 + dy);
            row[..w].copy_from_slice(&self.values[start..start + w]);
        }
        Ok(())
    }

    /// Writes a dense `w × h` block into the window at `(x0, y0)`.
    pub fn write_window(
        &mut self,
        x0: usize,
        y0: usize,
        w: usize,
        h: usize,
        block: &[T],
    ) -> Result<(), StencilError> {
        self.check_window(x0, y0, w, h, block.len())?;
        for (dy, row) in block.chunks_exact(w.max(1)).take(h).enumerate() {
            let start = x0 + self.size_x * (y0 + dy);
            self.values[start..start + w].copy_from_slice(&row[..w]);
        }
        Ok(())
    }

    fn check_window(
        &self,
        x0: usize,
        y0: usize,
        w: usize,
        h: usize,
        buf_len: usize,
    ) -> Result<(), StencilError> {
        if buf_len != w * h {
            return Err(StencilError::ShapeMismatch {
                what: "window buffer",
                expected: w * h,
                actual: buf_len,
            });
        }
        if x0 + w > self.size_x || y0 + h > self.size_y {
            return Err(StencilError::WindowOutOfBounds {
                x0,
                y0,
                w,
                h,
                size_x: self.size_x,
                size_y: self.size_y,
            });
        }
        Ok(())
    }
}

#[inline]
fn bits_eq<T: Scalar>(a: T, b: T) -> bool {
    bytemuck::bytes_of(&a) == bytemuck::bytes_of(&b)
}

impl<T: Scalar> fmt::Display for GlobalField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.values.chunks(self.size_x) {
            for v in row {
                write!(f, "{v} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<T> fmt::Debug for GlobalField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalField")
            .field("size_x", &self.size_x)
            .field("size_y", &self.size_y)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_index_is_halo_inclusive() {
        let e = Extent::new(3, 2);
        assert_eq!(e.stride(), 5);
        assert_eq!(e.len(), 20);
        assert_eq!(e.idx(0, 0), 0);
        assert_eq!(e.idx(1, 1), 6);
        assert_eq!(e.idx(4, 3), 19);
    }

    #[test]
    fn ramp_sets_border_and_zero_interior() {
        let f = GlobalField::<f32>::ramp(4, 4).unwrap();
        // top row: x, bottom row: size_x-1-x, except corners owned by columns
        assert_eq!(f.get(1, 0), 1.0);
        assert_eq!(f.get(2, 0), 2.0);
        assert_eq!(f.get(1, 3), 2.0);
        assert_eq!(f.get(2, 3), 1.0);
        // left column: y, right column: size_y-1-y
        assert_eq!(f.get(0, 1), 1.0);
        assert_eq!(f.get(3, 1), 2.0);
        assert_eq!(f.get(0, 3), 3.0);
        assert_eq!(f.get(3, 0), 3.0);
        assert_eq!(f.get(3, 3), 0.0);
        for (x, y) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
            assert_eq!(f.get(x, y), 0.0);
        }
    }

    #[test]
    fn too_small_grid_is_rejected() {
        let err = GlobalField::<f64>::ramp(1, 5).unwrap_err();
        assert_eq!(
            err,
            StencilError::InvalidGridSize {
                size_x: 1,
                size_y: 5
            }
        );
    }

    #[test]
    fn border_coords_visit_each_cell_once() {
        let f = GlobalField::<f64>::zeroed(5, 3).unwrap();
        assert_eq!(f.border_coords().count(), 2 * 5 + 2 * 3 - 4);
        let g = GlobalField::<f64>::zeroed(2, 2).unwrap();
        assert_eq!(g.border_coords().count(), 4);
    }

    #[test]
    fn window_copy_and_write_are_inverse() {
        let src = GlobalField::<f64>::ramp(6, 5).unwrap();
        let mut buf = vec![0.0; 3 * 2];
        src.copy_window(2, 3, 3, 2, &mut buf).unwrap();
        let mut dst = GlobalField::<f64>::zeroed(6, 5).unwrap();
        dst.write_window(2, 3, 3, 2, &buf).unwrap();
        for y in 3..5 {
            for x in 2..5 {
                assert_eq!(dst.get(x, y), src.get(x, y));
            }
        }
    }

    #[test]
    fn window_out_of_bounds_errors() {
        let f = GlobalField::<f32>::zeroed(4, 4).unwrap();
        let mut buf = vec![0.0; 4];
        assert!(matches!(
            f.copy_window(3, 3, 2, 2, &mut buf),
            Err(StencilError::WindowOutOfBounds { .. })
        ));
    }
}
