#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod cloud;
pub mod detector;
pub mod diagnostics;
pub mod io;
pub mod types;

// “Expert” modules – still public, but considered unstable internals.
pub mod config;
pub mod draw;
pub mod geom;
pub mod knn;
pub mod voxel;

// --- High-level re-exports -------------------------------------------------

// Main entry points: detector + results.
pub use crate::detector::{BranchDetector, BranchParams, ParallelRefineOptions};
pub use crate::types::{Branch, SkeletonResult};

// High-level diagnostics returned by the detector.
pub use crate::diagnostics::{ExtractionDiagnostics, ExtractionReport};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use branch_detector::prelude::*;
/// use nalgebra::Vector3;
///
/// # fn main() {
/// let points = vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.02)];
/// let cloud = RayCloud::from_points(points);
///
/// let detector = BranchDetector::new(BranchParams::default());
/// let result = detector.extract(&cloud);
/// println!(
///     "branches={} trees={} latency_ms={:.3}",
///     result.branches.len(),
///     result.roots.len(),
///     result.latency_ms
/// );
/// # }
/// ```
pub mod prelude {
    pub use crate::cloud::{PointCloudView, RayCloud};
    pub use crate::{Branch, BranchDetector, BranchParams, SkeletonResult};
}
