//! Boundary (halo) exchange between Cartesian neighbors.
//!
//! After each local update, four paired transfers refresh the halo ring of
//! the *current* buffer:
//!
//! | # | send                  | to      | receive into           | from    |
//! |---|-----------------------|---------|------------------------|---------|
//! | 0 | interior row `1`      | `up`    | halo row `ny + 1`      | `down`  |
//! | 1 | interior row `ny`     | `down`  | halo row `0`           | `up`    |
//! | 2 | interior column `1`   | `left`  | halo column `nx + 1`   | `right` |
//! | 3 | interior column `nx`  | `right` | halo column `0`        | `left`  |
//!
//! Each transfer is a single [`Communicator::sendrecv`], so a chain of
//! processes along an axis shifts its data in one go without any process
//! waiting on a send. Sides without a neighbor are skipped and their halo
//! cells keep the values they were seeded with.

use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::wire::{cast_slice, cast_slice_mut};
use crate::data::field::Extent;
use crate::data::scalar::Scalar;
use crate::stencil_error::StencilError;
use crate::topology::cartesian::{Direction, Neighbors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    Row(usize),
    Col(usize),
}

#[derive(Debug, Clone, Copy)]
struct Transfer {
    send: Line,
    to: Direction,
    recv: Line,
}

impl Transfer {
    fn from(&self) -> Direction {
        self.to.opposite()
    }
}

/// Halo exchange state for one process: neighbor ranks plus scratch lines
/// allocated once.
#[derive(Debug)]
pub struct HaloExchange<T> {
    extent: Extent,
    neighbors: Neighbors,
    tag: CommTag,
    send: Vec<T>,
    recv: Vec<T>,
}

impl<T: Scalar> HaloExchange<T> {
    /// `tag` and the three tags above it are reserved for the exchange.
    pub fn new(extent: Extent, neighbors: Neighbors, tag: CommTag) -> Self {
        let n = extent.nx.max(extent.ny);
        Self {
            extent,
            neighbors,
            tag,
            send: vec![T::zero(); n],
            recv: vec![T::zero(); n],
        }
    }

    fn transfers(&self) -> [Transfer; 4] {
        let Extent { nx, ny } = self.extent;
        [
            Transfer {
                send: Line::Row(1),
                to: Direction::Up,
                recv: Line::Row(ny + 1),
            },
            Transfer {
                send: Line::Row(ny),
                to: Direction::Down,
                recv: Line::Row(0),
            },
            Transfer {
                send: Line::Col(1),
                to: Direction::Left,
                recv: Line::Col(nx + 1),
            },
            Transfer {
                send: Line::Col(nx),
                to: Direction::Right,
                recv: Line::Col(0),
            },
        ]
    }

    fn line_len(&self, line: Line) -> usize {
        match line {
            Line::Row(_) => self.extent.nx,
            Line::Col(_) => self.extent.ny,
        }
    }

    /// Refreshes the halo ring of `cur` from the four neighbors.
    ///
    /// Must only be called once every worker has finished writing `cur`.
    pub fn exchange<C: Communicator>(&mut self, comm: &C, cur: &mut [T]) -> Result<(), StencilError> {
        if cur.len() != self.extent.len() {
            return Err(StencilError::ShapeMismatch {
                what: "halo exchange buffer",
                expected: self.extent.len(),
                actual: cur.len(),
            });
        }
        for (i, t) in self.transfers().into_iter().enumerate() {
            let dest = self.neighbors.get(t.to);
            let source = self.neighbors.get(t.from());
            if dest.is_none() && source.is_none() {
                continue;
            }
            let n = self.line_len(t.send);
            if dest.is_some() {
                pack(self.extent, cur, t.send, &mut self.send[..n]);
            }
            comm.sendrecv(
                dest,
                cast_slice(&self.send[..n]),
                source,
                cast_slice_mut(&mut self.recv[..n]),
                self.tag.offset(i as u16).as_u16(),
            )?;
            if source.is_some() {
                unpack(self.extent, &self.recv[..n], t.recv, cur);
            }
        }
        Ok(())
    }
}

fn pack<T: Scalar>(e: Extent, buf: &[T], line: Line, out: &mut [T]) {
    match line {
        Line::Row(y) => {
            let start = e.idx(1, y);
            out.copy_from_slice(&buf[start..start + e.nx]);
        }
        Line::Col(x) => {
            for (y, v) in out.iter_mut().enumerate() {
                *v = buf[e.idx(x, y + 1)];
            }
        }
    }
}

fn unpack<T: Scalar>(e: Extent, src: &[T], line: Line, buf: &mut [T]) {
    match line {
        Line::Row(y) => {
            let start = e.idx(1, y);
            buf[start..start + e.nx].copy_from_slice(src);
        }
        Line::Col(x) => {
            for (y, v) in src.iter().enumerate() {
                buf[e.idx(x, y + 1)] = *v;
            }
        }
    }
}
