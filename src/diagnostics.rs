//! Structured reports describing what each extraction stage did.
//!
//! Everything here serializes to JSON for offline inspection; vectors are
//! stored as plain arrays to keep the output stable and easy to consume.

use crate::types::SkeletonResult;
use serde::Serialize;

/// Shape of the input cloud as the pipeline saw it.
#[derive(Clone, Debug, Serialize)]
pub struct InputDiagnostics {
    pub point_count: usize,
    pub bounded_count: usize,
    pub min_bound: [f64; 3],
    pub max_bound: [f64; 3],
    /// Estimated nearest-neighbour spacing of the bounded points.
    pub point_spacing: f64,
    /// Finest seeding cell width.
    pub voxel_width: f64,
}

/// Candidate counts per seeding voxelization.
#[derive(Clone, Debug, Serialize)]
pub struct SeedDiagnostics {
    pub candidates: usize,
    pub occupied_cells: usize,
    pub elapsed_ms: f64,
}

/// Survivor counts across the refinement iterations.
#[derive(Clone, Debug, Serialize)]
pub struct RefineDiagnostics {
    pub iterations: usize,
    /// Active candidates after each iteration.
    pub active_per_iteration: Vec<usize>,
    /// Candidates that produced at least one scored snapshot.
    pub scored: usize,
    pub elapsed_ms: f64,
}

/// Score pruning and duplicate removal counts.
#[derive(Clone, Debug, Serialize)]
pub struct PruneDiagnostics {
    pub scored_input: usize,
    pub kept_after_score: usize,
    pub duplicates_removed: usize,
    pub kept: usize,
    pub elapsed_ms: f64,
}

/// Skeleton search outcome.
#[derive(Clone, Debug, Serialize)]
pub struct SkeletonDiagnostics {
    pub seeded_roots: usize,
    pub tree_roots: usize,
    pub visited: usize,
    pub unreached: usize,
    pub elapsed_ms: f64,
}

/// One surviving branch, sampled into the report when `verbose` is set.
#[derive(Clone, Debug, Serialize)]
pub struct BranchSample {
    pub centre: [f64; 3],
    pub direction: [f64; 3],
    pub radius: f64,
    pub length: f64,
    pub score: f64,
    pub parent: Option<usize>,
}

/// Stage-by-stage trace of one extraction.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ExtractionDiagnostics {
    pub input: Option<InputDiagnostics>,
    pub seed: Option<SeedDiagnostics>,
    pub refine: Option<RefineDiagnostics>,
    pub prune: Option<PruneDiagnostics>,
    pub skeleton: Option<SkeletonDiagnostics>,
    /// Populated only when `verbose` is set in the parameters.
    pub branch_samples: Vec<BranchSample>,
    pub total_latency_ms: f64,
}

/// Result plus its extraction trace.
#[derive(Clone, Debug, Serialize)]
pub struct ExtractionReport {
    pub result: SkeletonResult,
    pub diagnostics: ExtractionDiagnostics,
}
