//! Candidate seeding over four overlapping voxelizations.
//!
//! Branches of unknown thickness and phase are covered by voxelizing the
//! cloud twice at the nominal cell width and twice at double that width,
//! each pair once at the lattice origin and once shifted by half a cell.
//! Any branch near the nominal scale then lands near the middle of at least
//! one sufficiently occupied cell, which becomes a vertical seed cylinder.

use super::params::SeedParams;
use crate::types::Branch;
use crate::voxel::OccupancyGrid;
use nalgebra::Vector3;

/// One candidate per occupied cell, across all four voxelizations.
///
/// A cell of width `w` seeds a vertical cylinder at the cell centre with
/// diameter `w / √2` (the nominal branch width resolvable at that cell
/// size) and length `height_to_width` times the diameter.
pub fn initialize_candidates(
    points: &[Vector3<f64>],
    min_bound: Vector3<f64>,
    voxel_width: f64,
    params: &SeedParams,
) -> Vec<Branch> {
    let half_cell = Vector3::repeat(0.5 * voxel_width);
    let mut grids = [
        OccupancyGrid::new(voxel_width, min_bound),
        OccupancyGrid::new(voxel_width, min_bound + half_cell),
        OccupancyGrid::new(2.0 * voxel_width, min_bound),
        OccupancyGrid::new(2.0 * voxel_width, min_bound + 2.0 * half_cell),
    ];
    for pos in points {
        for grid in &mut grids {
            grid.increment(pos);
        }
    }

    let mut candidates = Vec::new();
    for grid in &grids {
        grid.for_each(|cell, count| {
            if count < params.min_cell_count {
                return;
            }
            let diameter = grid.cell_width() / f64::sqrt(2.0);
            candidates.push(Branch::seed(
                grid.cell_centre(cell),
                0.5 * diameter,
                diameter * params.height_to_width,
            ));
        });
    }
    log::debug!(
        "BranchDetector::seed {} candidates from {} points",
        candidates.len(),
        points.len()
    );
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tight_cluster(at: Vector3<f64>, n: usize) -> Vec<Vector3<f64>> {
        (0..n)
            .map(|i| at + Vector3::new(0.001 * i as f64, 0.0, 0.0))
            .collect()
    }

    #[test]
    fn cluster_seeds_one_candidate_per_voxelization() {
        let points = tight_cluster(Vector3::new(0.05, 0.05, 0.05), 4);
        let candidates =
            initialize_candidates(&points, Vector3::zeros(), 0.2, &SeedParams::default());
        // one cell of each of the four voxelizations contains the cluster
        assert_eq!(candidates.len(), 4);
        for c in &candidates {
            assert!(c.active);
            assert_eq!(c.direction, Vector3::z());
            assert_eq!(c.length, 2.0 * c.radius * 4.0);
        }
    }

    #[test]
    fn sparse_cells_do_not_seed() {
        let points = vec![Vector3::new(0.05, 0.05, 0.05)];
        let candidates =
            initialize_candidates(&points, Vector3::zeros(), 0.2, &SeedParams::default());
        assert!(candidates.is_empty());
    }

    #[test]
    fn seed_geometry_follows_cell_width() {
        let points = tight_cluster(Vector3::new(0.1, 0.1, 0.1), 2);
        let candidates =
            initialize_candidates(&points, Vector3::zeros(), 0.2, &SeedParams::default());
        let fine: Vec<&Branch> = candidates
            .iter()
            .filter(|c| (c.radius - 0.1 / f64::sqrt(2.0)).abs() < 1e-12)
            .collect();
        let coarse: Vec<&Branch> = candidates
            .iter()
            .filter(|c| (c.radius - 0.2 / f64::sqrt(2.0)).abs() < 1e-12)
            .collect();
        assert_eq!(fine.len() + coarse.len(), candidates.len());
        assert!(!fine.is_empty() && !coarse.is_empty());
    }
}
