//! Raster model grid: a fixed-resolution 2-D lattice of nodes with uniform
//! spacing and a per-node boundary classification.
//!
//! Node ids are row-major (`id = row * cols + col`), row 0 is the north edge.
//! The boundary classification partitions the node set into core (interior,
//! advanced by every process) and boundary (fixed-value or closed) nodes and
//! is immutable for the lifetime of the grid.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Boundary role of a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    /// Interior node: uplifted and advanced by every process component.
    Core,
    /// Open boundary: held at its current value; flux crossing into it
    /// leaves the domain.
    FixedValue,
    /// Closed boundary: exchanges no flux and is excluded from every process.
    Closed,
}

/// Open/closed assignment for one perimeter edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStatus {
    Open,
    Closed,
}

/// Per-edge boundary specification. North is row 0, west is column 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryConfig {
    pub north: EdgeStatus,
    pub south: EdgeStatus,
    pub east: EdgeStatus,
    pub west: EdgeStatus,
}

impl BoundaryConfig {
    pub fn all_open() -> Self {
        Self {
            north: EdgeStatus::Open,
            south: EdgeStatus::Open,
            east: EdgeStatus::Open,
            west: EdgeStatus::Open,
        }
    }

    pub fn all_closed() -> Self {
        Self {
            north: EdgeStatus::Closed,
            south: EdgeStatus::Closed,
            east: EdgeStatus::Closed,
            west: EdgeStatus::Closed,
        }
    }

    /// Open outlets at the north and south edges, closed side walls:
    /// the 1-D hillslope-strip configuration.
    pub fn open_north_south() -> Self {
        Self {
            north: EdgeStatus::Open,
            south: EdgeStatus::Open,
            east: EdgeStatus::Closed,
            west: EdgeStatus::Closed,
        }
    }
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self::all_open()
    }
}

/// D8 neighbour offsets as `(d_row, d_col)`: N, S, W, E, then diagonals.
pub const D8_OFFSETS: [(isize, isize); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// A rectangular lattice with uniform node spacing in metres.
/// Immutable after construction.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    rows: usize,
    cols: usize,
    spacing: f64,
    status: Vec<NodeStatus>,
}

impl RasterGrid {
    /// Build a grid and classify its nodes from the per-edge boundary spec.
    /// Closed wins over open where two edges meet at a corner.
    pub fn new(
        rows: usize,
        cols: usize,
        spacing: f64,
        boundaries: BoundaryConfig,
    ) -> Result<Self, ModelError> {
        if rows < 3 || cols < 3 {
            return Err(ModelError::BadGrid(format!(
                "{rows}x{cols} grid has no interior; need at least 3x3"
            )));
        }
        if !(spacing > 0.0 && spacing.is_finite()) {
            return Err(ModelError::BadGrid(format!(
                "node spacing must be positive and finite, got {spacing}"
            )));
        }

        let edge_status = |e: EdgeStatus| match e {
            EdgeStatus::Open => NodeStatus::FixedValue,
            EdgeStatus::Closed => NodeStatus::Closed,
        };

        let mut status = vec![NodeStatus::Core; rows * cols];
        for c in 0..cols {
            status[c] = edge_status(boundaries.north);
            status[(rows - 1) * cols + c] = edge_status(boundaries.south);
        }
        for r in 0..rows {
            let west = edge_status(boundaries.west);
            let east = edge_status(boundaries.east);
            let iw = r * cols;
            let ie = r * cols + cols - 1;
            if status[iw] != NodeStatus::Closed {
                status[iw] = west;
            }
            if status[ie] != NodeStatus::Closed {
                status[ie] = east;
            }
        }

        Ok(Self {
            rows,
            cols,
            spacing,
            status,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Node spacing in metres.
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Area of one cell in square metres.
    pub fn cell_area(&self) -> f64 {
        self.spacing * self.spacing
    }

    pub fn node_count(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn node_id(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    #[inline]
    pub fn row_col(&self, id: usize) -> (usize, usize) {
        (id / self.cols, id % self.cols)
    }

    #[inline]
    pub fn status(&self, id: usize) -> NodeStatus {
        self.status[id]
    }

    #[inline]
    pub fn is_core(&self, id: usize) -> bool {
        self.status[id] == NodeStatus::Core
    }

    /// Iterate over core node ids in row-major order.
    pub fn core_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.node_count()).filter(|&i| self.is_core(i))
    }

    /// Neighbour id at `(d_row, d_col)` from `id`, or None past the lattice edge.
    #[inline]
    pub fn offset(&self, id: usize, d_row: isize, d_col: isize) -> Option<usize> {
        let (r, c) = self.row_col(id);
        let nr = r as isize + d_row;
        let nc = c as isize + d_col;
        if nr < 0 || nc < 0 || nr >= self.rows as isize || nc >= self.cols as isize {
            return None;
        }
        Some(nr as usize * self.cols + nc as usize)
    }

    /// Link distance for D8 offset `k` (indices into [`D8_OFFSETS`]):
    /// `spacing` for the four cardinal links, `spacing * sqrt(2)` for diagonals.
    #[inline]
    pub fn d8_distance(&self, k: usize) -> f64 {
        if k < 4 {
            self.spacing
        } else {
            self.spacing * std::f64::consts::SQRT_2
        }
    }
}
