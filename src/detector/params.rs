//! Parameter types configuring the extraction stages.
//!
//! This module groups knobs for candidate seeding, the iterative cylinder
//! refinement, score/overlap pruning, and the ground-to-canopy skeleton
//! search.
//!
//! Defaults are tuned for forestry-scale scans with branches around a
//! decimetre thick. For other scales, start with `mid_radius`; almost every
//! stage derives its working lengths from it.

use serde::{Deserialize, Serialize};

/// Detector-wide parameters controlling the multi-stage pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchParams {
    /// Radius (metres) of the branches the seeding voxelization targets.
    /// The finest seeding cell width is twice this value.
    pub mid_radius: f64,
    /// Record per-branch trace samples in the diagnostics report.
    pub verbose: bool,
    /// Candidate seeding over the overlapping voxelizations.
    pub seed: SeedParams,
    /// Iterative cylinder refinement.
    pub refine: RefineParams,
    /// Score pruning and duplicate-cylinder resolution.
    pub prune: PruneParams,
    /// Skeleton assembly over the surviving branches.
    pub skeleton: SkeletonParams,
}

impl Default for BranchParams {
    fn default() -> Self {
        Self {
            mid_radius: 0.1,
            verbose: false,
            seed: SeedParams::default(),
            refine: RefineParams::default(),
            prune: PruneParams::default(),
            skeleton: SkeletonParams::default(),
        }
    }
}

impl BranchParams {
    /// Cell width of the finest seeding voxelization.
    pub fn voxel_width(&self) -> f64 {
        2.0 * self.mid_radius
    }
}

/// Candidate seeding parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedParams {
    /// Minimum bounded points in a cell before it seeds a candidate.
    pub min_cell_count: u32,
    /// Cylinder length as a multiple of its diameter. Shared with the
    /// refiner, which re-derives length from the fitted radius.
    pub height_to_width: f64,
}

impl Default for SeedParams {
    fn default() -> Self {
        Self {
            min_cell_count: 2,
            height_to_width: 4.0,
        }
    }
}

/// Iterative refinement parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineParams {
    /// Number of refinement iterations applied to every candidate.
    pub iterations: usize,
    /// Candidates with fewer support points deactivate immediately.
    pub min_support_points: usize,
    /// Support is gathered out to this multiple of the current radius,
    /// so off-centre seeds can still reach the true surface.
    pub boundary_radius_scale: f64,
}

impl Default for RefineParams {
    fn default() -> Self {
        Self {
            iterations: 5,
            min_support_points: 6,
            boundary_radius_scale: 2.0,
        }
    }
}

/// Pruning parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneParams {
    /// Acceptance threshold on the residual-weighted support count.
    pub min_score: f64,
    /// Fraction of one cylinder's surface samples that must land inside
    /// another cylinder before the pair counts as duplicates.
    pub overlap_inside_fraction: f64,
}

impl Default for PruneParams {
    fn default() -> Self {
        Self {
            min_score: 40.0,
            overlap_inside_fraction: 0.4,
        }
    }
}

/// Skeleton search parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SkeletonParams {
    /// Neighbours per branch in the connectivity graph.
    pub search_size: usize,
    /// Lower clamp on the direction-alignment factor of the edge cost.
    /// Keeps the cost finite for edges perpendicular to both branches.
    pub alignment_floor: f64,
    /// Exponent applied to the alignment factor; higher values punish
    /// misaligned connections harder.
    pub alignment_power: i32,
}

impl Default for SkeletonParams {
    fn default() -> Self {
        Self {
            search_size: 20,
            alignment_floor: 0.001,
            alignment_power: 2,
        }
    }
}
