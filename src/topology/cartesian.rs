//! 2D Cartesian process topology.
//!
//! The process count is factored into a grid `[gx, gy]` that is as square
//! as possible. Ranks are laid out row-major over that grid
//! (`rank = cx * gy + cy`). Axis 0 (x) carries the left/right neighbors,
//! axis 1 (y) the up/down neighbors; there is no wraparound, so processes on
//! the edge of the grid have no neighbor on that side.
//!
//! Every process derives the same grid and the same subdomain extent from
//! `(nprocs, size_x, size_y)` alone, so no communication is needed here.

use crate::data::field::Extent;
use crate::stencil_error::{Axis, StencilError};

/// One of the four axis-aligned neighbor directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards `y - 1`.
    Up,
    /// Towards `y + 1`.
    Down,
    /// Towards `x - 1`.
    Left,
    /// Towards `x + 1`.
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// `(dx, dy)` coordinate shift.
    fn offset(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Neighbor ranks of one process; `None` marks the domain boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Neighbors {
    pub up: Option<usize>,
    pub down: Option<usize>,
    pub left: Option<usize>,
    pub right: Option<usize>,
}

impl Neighbors {
    pub fn get(&self, dir: Direction) -> Option<usize> {
        match dir {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// Number of sides that have a neighbor.
    pub fn count(&self) -> usize {
        Direction::ALL
            .iter()
            .filter(|&&d| self.get(d).is_some())
            .count()
    }
}

/// Factors `nprocs` into `[gx, gy]` with `gx >= gy` and the two factors as
/// close together as possible.
///
/// `gy` is the largest divisor of `nprocs` that does not exceed its square
/// root, which makes the result deterministic on every process.
pub fn dims_create(nprocs: usize) -> Result<[usize; 2], StencilError> {
    if nprocs == 0 {
        return Err(StencilError::InvalidProcessCount(nprocs));
    }
    let mut gy = nprocs.isqrt();
    while nprocs % gy != 0 {
        gy -= 1;
    }
    let dims = [nprocs / gy, gy];
    if dims[0] == 0 || dims[1] == 0 {
        return Err(StencilError::InvalidProcessGrid {
            gx: dims[0],
            gy: dims[1],
        });
    }
    Ok(dims)
}

/// Static per-process view of the decomposition.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartesianTopology {
    rank: usize,
    nprocs: usize,
    dims: [usize; 2],
    coords: [usize; 2],
    neighbors: Neighbors,
    global: [usize; 2],
    local: Extent,
}

impl CartesianTopology {
    /// Derives the topology of `rank` in a group of `nprocs` processes
    /// sharing a `size_x × size_y` global grid.
    ///
    /// Fails when the interior `(size - 2)` of either axis is not evenly
    /// divisible by the process grid along that axis.
    pub fn new(
        rank: usize,
        nprocs: usize,
        size_x: usize,
        size_y: usize,
    ) -> Result<Self, StencilError> {
        if size_x < 2 || size_y < 2 {
            return Err(StencilError::InvalidGridSize { size_x, size_y });
        }
        let dims = dims_create(nprocs)?;
        if rank >= nprocs {
            return Err(StencilError::RankOutOfRange { rank, size: nprocs });
        }
        let local = Extent::new(
            split_axis(Axis::X, size_x - 2, dims[0])?,
            split_axis(Axis::Y, size_y - 2, dims[1])?,
        );
        let coords = coords_of(dims, rank);
        let neighbor = |dir: Direction| shift(dims, coords, dir);
        let neighbors = Neighbors {
            up: neighbor(Direction::Up),
            down: neighbor(Direction::Down),
            left: neighbor(Direction::Left),
            right: neighbor(Direction::Right),
        };
        log::debug!(
            "rank {rank}/{nprocs}: grid {}x{}, coords ({}, {}), local {}x{}, neighbors {:?}",
            dims[0],
            dims[1],
            coords[0],
            coords[1],
            local.nx,
            local.ny,
            neighbors
        );
        Ok(Self {
            rank,
            nprocs,
            dims,
            coords,
            neighbors,
            global: [size_x, size_y],
            local,
        })
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    pub fn nprocs(&self) -> usize {
        self.nprocs
    }

    /// Process grid shape `[gx, gy]`.
    #[inline]
    pub fn dims(&self) -> [usize; 2] {
        self.dims
    }

    /// This process's `[cx, cy]`.
    #[inline]
    pub fn coords(&self) -> [usize; 2] {
        self.coords
    }

    #[inline]
    pub fn neighbors(&self) -> Neighbors {
        self.neighbors
    }

    #[inline]
    pub fn neighbor(&self, dir: Direction) -> Option<usize> {
        self.neighbors.get(dir)
    }

    /// Global grid dimensions `[size_x, size_y]`, border included.
    #[inline]
    pub fn global_size(&self) -> [usize; 2] {
        self.global
    }

    /// Interior extent shared by every process.
    #[inline]
    pub fn local_extent(&self) -> Extent {
        self.local
    }

    /// Coordinates of any rank in this topology.
    pub fn coords_of(&self, rank: usize) -> Result<[usize; 2], StencilError> {
        if rank >= self.nprocs {
            return Err(StencilError::RankOutOfRange {
                rank,
                size: self.nprocs,
            });
        }
        Ok(coords_of(self.dims, rank))
    }

    /// Rank at Cartesian coordinates `coords`.
    pub fn rank_of(&self, coords: [usize; 2]) -> Option<usize> {
        (coords[0] < self.dims[0] && coords[1] < self.dims[1])
            .then(|| coords[0] * self.dims[1] + coords[1])
    }

    /// Global position of the halo corner of `rank`'s window.
    ///
    /// The first interior cell of that rank sits one cell further in on
    /// both axes.
    pub fn origin_of(&self, rank: usize) -> Result<[usize; 2], StencilError> {
        let [cx, cy] = self.coords_of(rank)?;
        Ok([cx * self.local.nx, cy * self.local.ny])
    }

    /// This process's window origin.
    pub fn origin(&self) -> [usize; 2] {
        [
            self.coords[0] * self.local.nx,
            self.coords[1] * self.local.ny,
        ]
    }
}

fn split_axis(axis: Axis, interior: usize, parts: usize) -> Result<usize, StencilError> {
    if interior % parts != 0 {
        return Err(StencilError::UnevenDecomposition {
            axis,
            interior,
            parts,
        });
    }
    Ok(interior / parts)
}

#[inline]
fn coords_of(dims: [usize; 2], rank: usize) -> [usize; 2] {
    [rank / dims[1], rank % dims[1]]
}

fn shift(dims: [usize; 2], coords: [usize; 2], dir: Direction) -> Option<usize> {
    let (dx, dy) = dir.offset();
    let x = coords[0].checked_add_signed(dx)?;
    let y = coords[1].checked_add_signed(dy)?;
    (x < dims[0] && y < dims[1]).then(|| x * dims[1] + y)
}
