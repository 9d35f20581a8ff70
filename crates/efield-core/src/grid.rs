use crate::geom::{self, Vec2};
use serde::{Deserialize, Serialize};

/// Uniform lattice: `point(i, j) = origin + (i * cell_size, j * cell_size)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub origin: Vec2,
    pub cell_size: f64,
    pub dimensions: [usize; 2],
}

impl GridSpec {
    pub fn new(origin: Vec2, cell_size: f64, dimensions: [usize; 2]) -> Self {
        Self {
            origin,
            cell_size,
            dimensions,
        }
    }

    /// Grid of `dimensions` cells centered on `center`.
    pub fn centered(center: Vec2, cell_size: f64, dimensions: [usize; 2]) -> Self {
        let half = [
            dimensions[0] as f64 * cell_size / 2.0,
            dimensions[1] as f64 * cell_size / 2.0,
        ];
        Self::new(geom::sub(center, half), cell_size, dimensions)
    }

    #[inline]
    pub fn point(&self, i: usize, j: usize) -> Vec2 {
        [
            self.origin[0] + i as f64 * self.cell_size,
            self.origin[1] + j as f64 * self.cell_size,
        ]
    }

    pub fn width(&self) -> usize {
        self.dimensions[0]
    }

    pub fn height(&self) -> usize {
        self.dimensions[1]
    }

    /// `dimensions[0] * dimensions[1]`, or `None` on overflow.
    pub fn checked_node_count(&self) -> Option<usize> {
        self.dimensions[0].checked_mul(self.dimensions[1])
    }

    /// Node count including the closing row and column of corners.
    pub fn checked_corner_count(&self) -> Option<usize> {
        self.dimensions[0]
            .checked_add(1)?
            .checked_mul(self.dimensions[1].checked_add(1)?)
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::centered([0.0, 0.0], 1.0, [20, 20])
    }
}
