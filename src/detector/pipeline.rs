//! Detector pipeline orchestrating end-to-end branch extraction.
//!
//! The [`BranchDetector`] exposes a simple API: feed a ray cloud and get the
//! surviving branches connected into skeleton trees, with detailed
//! diagnostics. Internally it coordinates the voxel index, candidate
//! seeding, the iterative refinement schedule, score/overlap pruning, and
//! the ground-to-canopy skeleton search.
//!
//! Typical usage:
//! ```no_run
//! use branch_detector::{BranchDetector, BranchParams};
//! use branch_detector::cloud::RayCloud;
//!
//! # fn example(cloud: RayCloud) {
//! let detector = BranchDetector::new(BranchParams::default());
//! let result = detector.extract(&cloud);
//! println!("{} branches in {} trees", result.branches.len(), result.roots.len());
//! # }
//! ```

use super::overlap;
use super::params::BranchParams;
use super::refine::{self, CandidateSlot, ParallelRefineOptions, RefineContext};
use super::seeding;
use super::skeleton;
use crate::cloud::PointCloudView;
use crate::diagnostics::{
    ExtractionDiagnostics, ExtractionReport, InputDiagnostics, PruneDiagnostics,
    RefineDiagnostics, SeedDiagnostics, SkeletonDiagnostics,
};
use crate::knn;
use crate::types::{Branch, SkeletonResult};
use crate::voxel::PointGrid;
use nalgebra::Vector3;
use std::time::Instant;

/// Branch detector orchestrating seeding, refinement, pruning and skeleton
/// assembly.
pub struct BranchDetector {
    params: BranchParams,
    parallel: ParallelRefineOptions,
}

impl BranchDetector {
    /// Create a detector with the supplied parameters.
    pub fn new(params: BranchParams) -> Self {
        Self {
            params,
            parallel: ParallelRefineOptions::default(),
        }
    }

    /// Override how refinement passes are parallelized.
    pub fn with_parallel_options(mut self, parallel: ParallelRefineOptions) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn params(&self) -> &BranchParams {
        &self.params
    }

    /// Update the nominal branch radius the voxelizations target.
    pub fn set_mid_radius(&mut self, mid_radius: f64) {
        self.params.mid_radius = mid_radius;
    }

    /// Run the full pipeline and return only the result.
    pub fn extract(&self, cloud: &impl PointCloudView) -> SkeletonResult {
        self.extract_with_diagnostics(cloud).result
    }

    /// Run the full pipeline and capture detailed diagnostics.
    pub fn extract_with_diagnostics(&self, cloud: &impl PointCloudView) -> ExtractionReport {
        let total_start = Instant::now();
        let mut diagnostics = ExtractionDiagnostics::default();
        let voxel_width = self.params.voxel_width();

        let points: Vec<Vector3<f64>> = cloud.bounded_points().map(|(_, p)| p).collect();
        if points.is_empty() {
            log::debug!("BranchDetector::extract no bounded points");
            diagnostics.total_latency_ms = total_start.elapsed().as_secs_f64() * 1000.0;
            let result = SkeletonResult {
                voxel_width,
                latency_ms: diagnostics.total_latency_ms,
                ..SkeletonResult::default()
            };
            return ExtractionReport {
                result,
                diagnostics,
            };
        }

        let min_bound = cloud.min_bound();
        let max_bound = cloud.max_bound();
        let spacing = knn::estimate_spacing(&points);
        diagnostics.input = Some(InputDiagnostics {
            point_count: cloud.point_count(),
            bounded_count: points.len(),
            min_bound: min_bound.into(),
            max_bound: max_bound.into(),
            point_spacing: spacing,
            voxel_width,
        });
        log::debug!(
            "BranchDetector::extract {} bounded points, spacing {:.4}, voxel width {:.3}",
            points.len(),
            spacing,
            voxel_width
        );

        // stage 1+2: voxel index and candidate seeding
        let seed_start = Instant::now();
        let grid = PointGrid::build(&points, min_bound, voxel_width);
        let candidates =
            seeding::initialize_candidates(&points, min_bound, voxel_width, &self.params.seed);
        diagnostics.seed = Some(SeedDiagnostics {
            candidates: candidates.len(),
            occupied_cells: grid.occupied_cells(),
            elapsed_ms: seed_start.elapsed().as_secs_f64() * 1000.0,
        });

        // stage 3: iterative refinement
        let refine_start = Instant::now();
        let mut slots: Vec<CandidateSlot> = candidates.into_iter().map(CandidateSlot::new).collect();
        let ctx = RefineContext {
            points: &points,
            grid: &grid,
            spacing,
            mid_radius: self.params.mid_radius,
            height_to_width: self.params.seed.height_to_width,
            params: &self.params.refine,
        };
        let mut active_per_iteration = Vec::with_capacity(self.params.refine.iterations);
        for iteration in 0..self.params.refine.iterations {
            refine::refine_pass(&mut slots, &ctx, self.parallel);
            let active = slots.iter().filter(|s| s.current.active).count();
            active_per_iteration.push(active);
            log::debug!(
                "BranchDetector::refine iteration {}/{}: {} active",
                iteration + 1,
                self.params.refine.iterations,
                active
            );
        }
        let scored = slots.iter().filter(|s| s.best.is_some()).count();
        diagnostics.refine = Some(RefineDiagnostics {
            iterations: self.params.refine.iterations,
            active_per_iteration,
            scored,
            elapsed_ms: refine_start.elapsed().as_secs_f64() * 1000.0,
        });

        // stage 4: score pruning and duplicate removal
        let prune_start = Instant::now();
        let mut branches: Vec<Branch> = slots.into_iter().filter_map(|slot| slot.best).collect();
        let scored_input = branches.len();
        overlap::prune_by_score(&mut branches, self.params.prune.min_score);
        let kept_after_score = branches.len();
        let duplicates_removed = overlap::resolve_overlaps(&mut branches, &self.params.prune);
        diagnostics.prune = Some(PruneDiagnostics {
            scored_input,
            kept_after_score,
            duplicates_removed,
            kept: branches.len(),
            elapsed_ms: prune_start.elapsed().as_secs_f64() * 1000.0,
        });
        log::debug!(
            "BranchDetector::prune {} scored -> {} above threshold -> {} after overlap removal",
            scored_input,
            kept_after_score,
            branches.len()
        );

        // stage 5: skeleton assembly
        let skeleton_start = Instant::now();
        let (roots, summary) =
            skeleton::build_skeleton(&mut branches, min_bound.z, &self.params.skeleton);
        diagnostics.skeleton = Some(SkeletonDiagnostics {
            seeded_roots: summary.seeded_roots,
            tree_roots: roots.len(),
            visited: summary.visited,
            unreached: summary.unreached,
            elapsed_ms: skeleton_start.elapsed().as_secs_f64() * 1000.0,
        });
        log::debug!(
            "BranchDetector::skeleton {} roots, {} visited, {} unreached",
            roots.len(),
            summary.visited,
            summary.unreached
        );

        if self.params.verbose {
            diagnostics.branch_samples = branches
                .iter()
                .map(|b| crate::diagnostics::BranchSample {
                    centre: b.centre.into(),
                    direction: b.direction.into(),
                    radius: b.radius,
                    length: b.length,
                    score: b.score,
                    parent: b.parent,
                })
                .collect();
        }

        let latency_ms = total_start.elapsed().as_secs_f64() * 1000.0;
        diagnostics.total_latency_ms = latency_ms;
        let result = SkeletonResult {
            branches,
            roots,
            voxel_width,
            point_spacing: spacing,
            latency_ms,
        };
        ExtractionReport {
            result,
            diagnostics,
        }
    }
}
