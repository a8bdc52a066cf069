//! Per-process subdomain storage with current/previous roles.
//!
//! Both slots are allocated once, when the process context is built. A step
//! flips which slot is "current" instead of moving data, so the slot index
//! alone tracks time.

use crate::data::field::Extent;
use crate::data::scalar::Scalar;
use crate::stencil_error::StencilError;

/// Two halo-padded copies of one local subdomain.
#[derive(Debug, Clone)]
pub struct DoubleBuffer<T> {
    extent: Extent,
    slots: [Vec<T>; 2],
    current: usize,
}

impl<T: Scalar> DoubleBuffer<T> {
    /// Zero-filled buffers for an `extent`-sized interior plus halo.
    pub fn new(extent: Extent) -> Self {
        Self {
            extent,
            slots: [vec![T::zero(); extent.len()], vec![T::zero(); extent.len()]],
            current: 0,
        }
    }

    #[inline]
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Loads the same initial window into both roles.
    pub fn seed(&mut self, window: &[T]) -> Result<(), StencilError> {
        if window.len() != self.extent.len() {
            return Err(StencilError::ShapeMismatch {
                what: "subdomain window",
                expected: self.extent.len(),
                actual: window.len(),
            });
        }
        self.slots[0].copy_from_slice(window);
        self.slots[1].copy_from_slice(window);
        Ok(())
    }

    /// Exchanges the current and previous roles in O(1).
    #[inline]
    pub fn swap(&mut self) {
        self.current ^= 1;
    }

    /// Index of the slot that currently plays the "current" role.
    #[inline]
    pub fn current_slot(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn current(&self) -> &[T] {
        &self.slots[self.current]
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut [T] {
        &mut self.slots[self.current]
    }

    #[inline]
    pub fn previous(&self) -> &[T] {
        &self.slots[self.current ^ 1]
    }

    /// Read-only previous slot and writable current slot, borrowed together.
    pub fn split(&mut self) -> (&[T], &mut [T]) {
        let (a, b) = self.slots.split_at_mut(1);
        if self.current == 0 {
            (&b[0], &mut a[0])
        } else {
            (&a[0], &mut b[0])
        }
    }

    /// Copies the interior of the current slot into a dense `nx × ny` block.
    pub fn pack_interior(&self, out: &mut [T]) -> Result<(), StencilError> {
        let e = self.extent;
        if out.len() != e.interior_len() {
            return Err(StencilError::ShapeMismatch {
                what: "interior block",
                expected: e.interior_len(),
                actual: out.len(),
            });
        }
        if e.nx == 0 {
            return Ok(());
        }
        let cur = self.current();
        for (y, row) in out.chunks_exact_mut(e.nx).enumerate() {
            let start = e.idx(1, y + 1);
            row.copy_from_slice(&cur[start..start + e.nx]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_flips_roles_without_copying() {
        let mut buf = DoubleBuffer::<f64>::new(Extent::new(2, 2));
        buf.current_mut()[5] = 7.0;
        assert_eq!(buf.current_slot(), 0);
        buf.swap();
        assert_eq!(buf.current_slot(), 1);
        assert_eq!(buf.previous()[5], 7.0);
        assert_eq!(buf.current()[5], 0.0);
        buf.swap();
        assert_eq!(buf.current()[5], 7.0);
    }

    #[test]
    fn split_borrows_previous_and_current() {
        let mut buf = DoubleBuffer::<f32>::new(Extent::new(1, 1));
        buf.seed(&[1.0; 9]).unwrap();
        buf.swap();
        let (prev, cur) = buf.split();
        cur[4] = 3.0;
        assert_eq!(prev[4], 1.0);
        assert_eq!(buf.current()[4], 3.0);
        assert_eq!(buf.previous()[4], 1.0);
    }

    #[test]
    fn seed_rejects_wrong_length() {
        let mut buf = DoubleBuffer::<f32>::new(Extent::new(2, 3));
        let err = buf.seed(&[0.0; 3]).unwrap_err();
        assert!(matches!(err, StencilError::ShapeMismatch { expected: 20, .. }));
    }

    #[test]
    fn pack_interior_skips_halo() {
        let e = Extent::new(2, 2);
        let mut buf = DoubleBuffer::<f64>::new(e);
        let window: Vec<f64> = (0..e.len()).map(|i| i as f64).collect();
        buf.seed(&window).unwrap();
        let mut out = vec![0.0; 4];
        buf.pack_interior(&mut out).unwrap();
        assert_eq!(out, vec![5.0, 6.0, 9.0, 10.0]);
    }
}
