//! Uniform voxel structures over the bounded end points.
//!
//! Two views of the same idea serve different stages: [`PointGrid`] buckets
//! point indices for fast spatial gathering during refinement, while
//! [`OccupancyGrid`] only counts points per cell and drives candidate
//! seeding across the overlapping voxelizations.

use crate::geom::Cuboid;
use nalgebra::Vector3;
use std::collections::HashMap;

fn cell_of(pos: &Vector3<f64>, origin: &Vector3<f64>, cell_width: f64) -> [i32; 3] {
    let rel = (pos - origin) / cell_width;
    [
        rel.x.floor() as i32,
        rel.y.floor() as i32,
        rel.z.floor() as i32,
    ]
}

/// Uniform grid mapping integer cells to the indices of the points inside.
pub struct PointGrid {
    cells: HashMap<[i32; 3], Vec<u32>>,
    origin: Vector3<f64>,
    cell_width: f64,
}

impl PointGrid {
    /// Bucket every point into a grid of the given cell width.
    pub fn build(points: &[Vector3<f64>], origin: Vector3<f64>, cell_width: f64) -> Self {
        debug_assert!(cell_width > 0.0);
        let mut cells: HashMap<[i32; 3], Vec<u32>> = HashMap::new();
        for (index, pos) in points.iter().enumerate() {
            cells
                .entry(cell_of(pos, &origin, cell_width))
                .or_default()
                .push(index as u32);
        }
        Self {
            cells,
            origin,
            cell_width,
        }
    }

    pub fn cell_width(&self) -> f64 {
        self.cell_width
    }

    /// Number of occupied cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Point indices stored in one cell.
    pub fn points_in_cell(&self, cell: [i32; 3]) -> &[u32] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Visit the indices of every point whose cell intersects the cuboid.
    ///
    /// Cells are scanned in a fixed nested order, so the visit sequence is
    /// the same on every run.
    pub fn for_each_in_cuboid<F: FnMut(u32)>(&self, cuboid: &Cuboid, mut visit: F) {
        let min_cell = cell_of(&cuboid.min_bound, &self.origin, self.cell_width);
        let max_cell = cell_of(&cuboid.max_bound, &self.origin, self.cell_width);
        for x in min_cell[0]..=max_cell[0] {
            for y in min_cell[1]..=max_cell[1] {
                for z in min_cell[2]..=max_cell[2] {
                    if let Some(indices) = self.cells.get(&[x, y, z]) {
                        for &index in indices {
                            visit(index);
                        }
                    }
                }
            }
        }
    }
}

/// Per-cell point counter over one offset voxelization.
pub struct OccupancyGrid {
    counts: HashMap<[i32; 3], u32>,
    origin: Vector3<f64>,
    cell_width: f64,
}

impl OccupancyGrid {
    pub fn new(cell_width: f64, origin: Vector3<f64>) -> Self {
        debug_assert!(cell_width > 0.0);
        Self {
            counts: HashMap::new(),
            origin,
            cell_width,
        }
    }

    pub fn cell_width(&self) -> f64 {
        self.cell_width
    }

    /// Count one point into its cell.
    pub fn increment(&mut self, pos: &Vector3<f64>) {
        let cell = cell_of(pos, &self.origin, self.cell_width);
        *self.counts.entry(cell).or_insert(0) += 1;
    }

    /// Centre of a cell in world coordinates.
    pub fn cell_centre(&self, cell: [i32; 3]) -> Vector3<f64> {
        let mid = Vector3::new(
            cell[0] as f64 + 0.5,
            cell[1] as f64 + 0.5,
            cell[2] as f64 + 0.5,
        );
        self.origin + mid * self.cell_width
    }

    /// Visit every occupied cell with its count, in sorted cell order so
    /// downstream seeding is deterministic.
    pub fn for_each<F: FnMut([i32; 3], u32)>(&self, mut visit: F) {
        let mut cells: Vec<[i32; 3]> = self.counts.keys().copied().collect();
        cells.sort_unstable();
        for cell in cells {
            visit(cell, self.counts[&cell]);
        }
    }
}
