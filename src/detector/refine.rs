//! Iterative cylinder refinement of seeded candidates.
//!
//! Every candidate walks the same schedule: the first pass replaces the
//! vertical seed guess with a pose estimated from the principal axis of its
//! support; every later pass re-estimates direction, recentres the axis
//! (centroid along the axis, algebraic circle fit across it), then updates
//! radius, length and score from the radial residuals. A candidate
//! deactivates when its support shrinks below `min_support_points` or its
//! length collapses below the nominal branch radius; the best-scoring state
//! it ever reached is kept aside for the pruning stage.

use super::params::RefineParams;
use crate::geom::{perpendicular_axes, Cuboid};
use crate::types::Branch;
use crate::voxel::PointGrid;
use nalgebra::{Matrix3, Vector2, Vector3};

/// Refinement progress of one candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RefineStage {
    /// Direction is still the vertical seed guess; the next pass estimates
    /// an initial pose.
    Seeded,
    /// Pose known; steady-state updates apply.
    Oriented,
}

/// One candidate being refined, with its best snapshot kept aside.
#[derive(Clone, Debug)]
pub(crate) struct CandidateSlot {
    pub current: Branch,
    pub stage: RefineStage,
    /// Highest-score state seen so far. Stays valid even if the working
    /// copy later deactivates.
    pub best: Option<Branch>,
}

impl CandidateSlot {
    pub fn new(candidate: Branch) -> Self {
        Self {
            current: candidate,
            stage: RefineStage::Seeded,
            best: None,
        }
    }
}

/// Shared read-only inputs of a refinement pass.
pub(crate) struct RefineContext<'a> {
    pub points: &'a [Vector3<f64>],
    pub grid: &'a PointGrid,
    /// Estimated nearest-neighbour spacing; sets the residual scale of the
    /// score and pads the support gathering volume.
    pub spacing: f64,
    /// Nominal branch radius; lengths below it count as collapsed.
    pub mid_radius: f64,
    /// Length per unit diameter, shared with seeding.
    pub height_to_width: f64,
    pub params: &'a RefineParams,
}

/// Controls whether a refinement pass runs sequentially or with Rayon.
#[derive(Clone, Copy, Debug)]
pub struct ParallelRefineOptions {
    enabled: bool,
    min_candidates_for_parallel: usize,
}

impl ParallelRefineOptions {
    /// Construct explicit options.
    pub fn new(enabled: bool, min_candidates_for_parallel: usize) -> Self {
        Self {
            enabled,
            min_candidates_for_parallel: min_candidates_for_parallel.max(1),
        }
    }

    /// Disable parallel refinement regardless of candidate count.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            min_candidates_for_parallel: usize::MAX,
        }
    }

    /// Returns true when a pass over `candidate_count` slots should run in
    /// parallel.
    pub fn should_parallelize(&self, candidate_count: usize) -> bool {
        self.enabled && candidate_count >= self.min_candidates_for_parallel
    }
}

impl Default for ParallelRefineOptions {
    fn default() -> Self {
        Self {
            enabled: cfg!(feature = "parallel"),
            min_candidates_for_parallel: 256,
        }
    }
}

/// Run one refinement pass over every slot.
///
/// Slots are independent within a pass; all of them see the candidate
/// states from the end of the previous pass.
pub(crate) fn refine_pass(
    slots: &mut [CandidateSlot],
    ctx: &RefineContext<'_>,
    parallel: ParallelRefineOptions,
) {
    if parallel.should_parallelize(slots.len()) {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            slots.par_iter_mut().for_each(|slot| refine_one(slot, ctx));
            return;
        }
    }
    for slot in slots.iter_mut() {
        refine_one(slot, ctx);
    }
}

fn refine_one(slot: &mut CandidateSlot, ctx: &RefineContext<'_>) {
    if !slot.current.active {
        return;
    }
    let support = collect_support(&slot.current, ctx);
    if support.len() < ctx.params.min_support_points {
        slot.current.active = false;
        return;
    }
    match slot.stage {
        RefineStage::Seeded => {
            if estimate_pose(&mut slot.current, &support) {
                slot.stage = RefineStage::Oriented;
            } else {
                slot.current.active = false;
            }
        }
        RefineStage::Oriented => {
            update_direction(&mut slot.current, &support);
            update_centre(&mut slot.current, &support);
            update_radius_and_score(
                &mut slot.current,
                &support,
                ctx.spacing,
                ctx.height_to_width,
            );
            let improved = slot
                .best
                .as_ref()
                .map_or(true, |b| slot.current.score > b.score);
            if improved {
                slot.best = Some(slot.current.clone());
            }
            if slot.current.length < ctx.mid_radius {
                slot.current.active = false;
            }
        }
    }
}

/// Points within the expanded cylinder volume of the candidate.
///
/// The radius is scaled by `boundary_radius_scale` and both extents are
/// padded by the point spacing, so a seed that is off-centre or too small
/// still reaches the surface it should lock onto.
fn collect_support(branch: &Branch, ctx: &RefineContext<'_>) -> Vec<Vector3<f64>> {
    let outer_radius = branch.radius * ctx.params.boundary_radius_scale + ctx.spacing;
    let half_length = 0.5 * branch.length + ctx.spacing;

    let axis = branch.direction * half_length;
    let low = branch.centre - axis;
    let high = branch.centre + axis;
    let pad = Vector3::repeat(outer_radius);
    let bounds = Cuboid::new(low.inf(&high) - pad, low.sup(&high) + pad);

    let outer2 = outer_radius * outer_radius;
    let mut support = Vec::new();
    ctx.grid.for_each_in_cuboid(&bounds, |index| {
        let pos = ctx.points[index as usize];
        let rel = pos - branch.centre;
        let h = rel.dot(&branch.direction);
        if h.abs() > half_length {
            return;
        }
        let radial = rel - branch.direction * h;
        if radial.norm_squared() <= outer2 {
            support.push(pos);
        }
    });
    support
}

fn centroid(points: &[Vector3<f64>]) -> Vector3<f64> {
    let sum = points.iter().fold(Vector3::zeros(), |acc, p| acc + p);
    sum / points.len() as f64
}

/// Principal axis of a point set about its centroid, or None when the
/// scatter is degenerate.
fn principal_axis(points: &[Vector3<f64>], mean: &Vector3<f64>) -> Option<Vector3<f64>> {
    let mut scatter = Matrix3::zeros();
    for p in points {
        let rel = p - mean;
        scatter += rel * rel.transpose();
    }
    scatter /= points.len() as f64;
    let eigen = scatter.symmetric_eigen();
    let mut largest = 0;
    for i in 1..3 {
        if eigen.eigenvalues[i] > eigen.eigenvalues[largest] {
            largest = i;
        }
    }
    if !eigen.eigenvalues[largest].is_finite() || eigen.eigenvalues[largest] <= 0.0 {
        return None;
    }
    let axis = eigen.eigenvectors.column(largest).into_owned();
    let norm = axis.norm();
    if norm < 1e-12 {
        return None;
    }
    Some(axis / norm)
}

/// First-pass pose: centre on the support centroid, axis from its principal
/// direction, radius from the mean radial distance about that axis.
/// Returns false when the support cannot orient the candidate.
fn estimate_pose(branch: &mut Branch, support: &[Vector3<f64>]) -> bool {
    let mean = centroid(support);
    match principal_axis(support, &mean) {
        Some(mut axis) => {
            if axis.z < 0.0 {
                axis = -axis;
            }
            branch.centre = mean;
            branch.direction = axis;
            let radial: f64 = support.iter().map(|p| branch.radial_distance(p)).sum();
            branch.radius = radial / support.len() as f64;
            true
        }
        None => false,
    }
}

/// Steady-state direction update, sign-matched to the previous axis.
fn update_direction(branch: &mut Branch, support: &[Vector3<f64>]) {
    let mean = centroid(support);
    if let Some(mut axis) = principal_axis(support, &mean) {
        if axis.dot(&branch.direction) < 0.0 {
            axis = -axis;
        }
        branch.direction = axis;
    }
}

/// Recentre the axis: follow the support centroid along the direction,
/// then correct across it with an algebraic (Kåsa) circle fit of the
/// perpendicular offsets. The circle fit keeps one-sided scans from
/// dragging the centre towards the scanner.
fn update_centre(branch: &mut Branch, support: &[Vector3<f64>]) {
    let mean = centroid(support);
    let axial = (mean - branch.centre).dot(&branch.direction);
    branch.centre += branch.direction * axial;

    let (ax1, ax2) = perpendicular_axes(&branch.direction);
    let mut offsets: Vec<Vector2<f64>> = support
        .iter()
        .map(|p| {
            let rel = p - branch.centre;
            Vector2::new(rel.dot(&ax1), rel.dot(&ax2))
        })
        .collect();
    let mut plane_mean = Vector2::zeros();
    for o in &offsets {
        plane_mean += *o;
    }
    plane_mean /= offsets.len() as f64;
    for o in &mut offsets {
        *o -= plane_mean;
    }

    // circle centre of the centred offsets: 0.5 * M^-1 * [sxz, syz]
    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    let mut sxz = 0.0;
    let mut syz = 0.0;
    for o in &offsets {
        let z = o.x * o.x + o.y * o.y;
        sxx += o.x * o.x;
        syy += o.y * o.y;
        sxy += o.x * o.y;
        sxz += o.x * z;
        syz += o.y * z;
    }
    let det = sxx * syy - sxy * sxy;
    let correction = if det.abs() > 1e-12 {
        Vector2::new(sxz * syy - syz * sxy, syz * sxx - sxz * sxy) * (0.5 / det)
    } else {
        Vector2::zeros()
    };

    let shift = plane_mean + correction;
    branch.centre += ax1 * shift.x + ax2 * shift.y;
}

/// Radius from the mean radial distance; length re-derived from it; score
/// as a residual-weighted support count. Each point contributes
/// `1 / (1 + (e / spacing)²)` where `e` is its radial residual, so a crisp
/// cylindrical shell counts nearly every point while diffuse clutter
/// counts almost nothing.
fn update_radius_and_score(
    branch: &mut Branch,
    support: &[Vector3<f64>],
    spacing: f64,
    height_to_width: f64,
) {
    let radial: Vec<f64> = support.iter().map(|p| branch.radial_distance(p)).collect();
    let mean_radius = radial.iter().sum::<f64>() / radial.len() as f64;

    let sigma = spacing.max(1e-6);
    let mut score = 0.0;
    for dist in &radial {
        let e = (dist - mean_radius) / sigma;
        score += 1.0 / (1.0 + e * e);
    }

    branch.radius = mean_radius;
    branch.length = 2.0 * mean_radius * height_to_width;
    branch.score = score;
}
