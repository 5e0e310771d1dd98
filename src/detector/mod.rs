//! Branch detector orchestrating a seed-refine-prune-connect pipeline.
//!
//! Overview
//! - Buckets the bounded ray end points into a uniform voxel index.
//! - Seeds one vertical cylinder candidate per sufficiently occupied cell
//!   of four overlapping voxelizations (two widths, two lattice offsets),
//!   so branches of unknown thickness and phase are always covered.
//! - Refines every candidate for a fixed number of iterations: principal
//!   axis for direction, centroid plus algebraic circle fit for the centre,
//!   mean radial distance for radius, and a residual-weighted support count
//!   as the score. Starved or collapsed candidates deactivate; the best
//!   state of each candidate is kept aside.
//! - Prunes snapshots below the acceptance score, then removes the smaller
//!   of any two cylinders whose sampled surfaces overlap.
//! - Connects survivors ground-to-canopy with a priority-queue search over
//!   a k-nearest-neighbour graph, yielding one tree per surviving root.
//!
//! Modules
//! - [`params`] – configuration types used by the detector and CLI.
//! - `pipeline` – the main [`BranchDetector`] implementation.
//! - `seeding` – occupancy-driven candidate initialization.
//! - `refine` – the per-candidate refinement engine.
//! - `overlap` – score pruning and duplicate-cylinder resolution.
//! - `skeleton` – root selection and the shortest-path forest.
//!
//! Key Ideas
//! - Every stage derives its working lengths from `mid_radius`, so one
//!   parameter adapts the detector to a different branch scale.
//! - Candidate refinement is independent per candidate within a pass,
//!   which is what makes the optional Rayon path safe.
//! - The skeleton edge cost divides squared distance by squared direction
//!   alignment: connections along the branch flow are cheap, perpendicular
//!   jumps between neighbouring trees are punishingly expensive.

pub mod params;

mod overlap;
mod pipeline;
mod refine;
mod seeding;
mod skeleton;

pub use params::{BranchParams, PruneParams, RefineParams, SeedParams, SkeletonParams};
pub use pipeline::BranchDetector;
pub use refine::ParallelRefineOptions;
