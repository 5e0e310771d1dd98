//! Score pruning and duplicate-cylinder resolution.
//!
//! After refinement many candidates have converged onto the same physical
//! branch. Every pair whose bounding boxes touch is compared by sampling a
//! small fixed pattern on one cylinder's surface and counting how many
//! samples land inside the other; past a threshold fraction the pair is a
//! duplicate and the smaller cylinder (by radius² · length) is removed.

use super::params::PruneParams;
use crate::geom::perpendicular_axes;
use crate::types::Branch;

/// Drop branches that never reached the acceptance score.
pub(crate) fn prune_by_score(branches: &mut Vec<Branch>, min_score: f64) {
    branches.retain(|b| b.active && b.score >= min_score);
}

// 5 x 5 sample pattern: one ring of radial offsets crossed with five
// stations along the axis, spanning 80% of radius and length.
const SAMPLE_SPAN: f64 = 0.8;
const RADIAL_STEPS: [(f64, f64); 5] = [
    (0.0, 0.0),
    (SAMPLE_SPAN, 0.0),
    (0.0, SAMPLE_SPAN),
    (-SAMPLE_SPAN, 0.0),
    (0.0, -SAMPLE_SPAN),
];
const AXIAL_STEPS: [f64; 5] = [
    -0.5 * SAMPLE_SPAN,
    -0.25 * SAMPLE_SPAN,
    0.0,
    0.25 * SAMPLE_SPAN,
    0.5 * SAMPLE_SPAN,
];

/// Fraction of the sample pattern of `a` that lies inside cylinder `b`.
fn inside_fraction(a: &Branch, b: &Branch) -> f64 {
    let (ax1, ax2) = perpendicular_axes(&a.direction);
    let mut inside = 0usize;
    for &axial in &AXIAL_STEPS {
        let station = a.centre + a.direction * (axial * a.length);
        for &(u, v) in &RADIAL_STEPS {
            let pos = station + (ax1 * u + ax2 * v) * a.radius;
            if b.contains(&pos) {
                inside += 1;
            }
        }
    }
    inside as f64 / (AXIAL_STEPS.len() * RADIAL_STEPS.len()) as f64
}

/// Remove the smaller of every duplicate pair. Returns the removal count.
///
/// The scan is quadratic with a bounding-box reject. Removing the current
/// branch re-runs its slot (another branch was swapped in); removing a
/// branch at a lower index only marks it inactive so the indices already
/// scanned stay valid, with a final compaction at the end.
pub(crate) fn resolve_overlaps(branches: &mut Vec<Branch>, params: &PruneParams) -> usize {
    let mut removed = 0usize;
    let mut i = 0usize;
    while i < branches.len() {
        if !branches[i].active {
            i += 1;
            continue;
        }
        let bounds_i = branches[i].bounding_cuboid();
        let mut advance = true;
        let mut j = 0usize;
        while j < branches.len() {
            if j == i || !branches[j].active {
                j += 1;
                continue;
            }
            if !bounds_i.overlaps(&branches[j].bounding_cuboid()) {
                j += 1;
                continue;
            }
            if inside_fraction(&branches[i], &branches[j]) > params.overlap_inside_fraction {
                removed += 1;
                let volume_i = branches[i].volume();
                let volume_j = branches[j].volume();
                // equal volumes drop the higher index
                if volume_i < volume_j || (volume_i == volume_j && i > j) {
                    branches.swap_remove(i);
                    advance = false;
                } else if j > i {
                    branches.swap_remove(j);
                } else {
                    branches[j].active = false;
                }
                break;
            }
            j += 1;
        }
        if advance {
            i += 1;
        }
    }
    branches.retain(|b| b.active);
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn scored(centre: Vector3<f64>, radius: f64, length: f64, score: f64) -> Branch {
        let mut b = Branch::seed(centre, radius, length);
        b.score = score;
        b
    }

    #[test]
    fn score_pruning_keeps_active_scorers() {
        let mut branches = vec![
            scored(Vector3::zeros(), 0.05, 0.4, 120.0),
            scored(Vector3::new(1.0, 0.0, 0.0), 0.05, 0.4, 12.0),
        ];
        let mut never_refined = scored(Vector3::new(2.0, 0.0, 0.0), 0.05, 0.4, 100.0);
        never_refined.active = false;
        branches.push(never_refined);

        prune_by_score(&mut branches, 40.0);
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].score, 120.0);
    }

    #[test]
    fn coincident_cylinders_keep_the_larger() {
        let mut branches = vec![
            scored(Vector3::zeros(), 0.04, 0.32, 90.0),
            scored(Vector3::new(0.005, 0.0, 0.0), 0.06, 0.48, 80.0),
        ];
        let removed = resolve_overlaps(&mut branches, &PruneParams::default());
        assert_eq!(removed, 1);
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].radius, 0.06);
    }

    #[test]
    fn equal_volume_ties_drop_the_higher_index() {
        let mut branches = vec![
            scored(Vector3::zeros(), 0.05, 0.4, 90.0),
            scored(Vector3::new(0.003, 0.0, 0.0), 0.05, 0.4, 85.0),
        ];
        let removed = resolve_overlaps(&mut branches, &PruneParams::default());
        assert_eq!(removed, 1);
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].centre, Vector3::zeros());
    }

    #[test]
    fn disjoint_cylinders_are_untouched() {
        let mut branches = vec![
            scored(Vector3::zeros(), 0.05, 0.4, 90.0),
            scored(Vector3::new(1.0, 0.0, 0.0), 0.05, 0.4, 80.0),
        ];
        let removed = resolve_overlaps(&mut branches, &PruneParams::default());
        assert_eq!(removed, 0);
        assert_eq!(branches.len(), 2);
    }

    #[test]
    fn axially_stacked_cylinders_with_separated_spans_both_survive() {
        // bounding boxes touch but the sample pattern of one never enters
        // the other's axial span
        let mut branches = vec![
            scored(Vector3::new(0.0, 0.0, 0.0), 0.05, 0.4, 90.0),
            scored(Vector3::new(0.0, 0.0, 0.45), 0.05, 0.4, 85.0),
        ];
        let removed = resolve_overlaps(&mut branches, &PruneParams::default());
        assert_eq!(removed, 0);
        assert_eq!(branches.len(), 2);
    }

    #[test]
    fn chain_of_duplicates_collapses_to_the_largest() {
        let mut branches = vec![
            scored(Vector3::new(0.002, 0.0, 0.0), 0.050, 0.40, 90.0),
            scored(Vector3::new(0.000, 0.002, 0.0), 0.052, 0.42, 88.0),
            scored(Vector3::new(-0.002, 0.0, 0.0), 0.054, 0.44, 86.0),
        ];
        resolve_overlaps(&mut branches, &PruneParams::default());
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].radius, 0.054);
    }

    #[test]
    fn every_survivor_pair_is_below_the_overlap_threshold() {
        let params = PruneParams::default();
        let mut branches = vec![
            scored(Vector3::new(0.0, 0.0, 0.0), 0.05, 0.4, 90.0),
            scored(Vector3::new(0.01, 0.0, 0.05), 0.05, 0.4, 85.0),
            scored(Vector3::new(0.0, 0.01, 0.3), 0.05, 0.4, 80.0),
            scored(Vector3::new(0.6, 0.0, 0.0), 0.05, 0.4, 75.0),
        ];
        resolve_overlaps(&mut branches, &params);
        for i in 0..branches.len() {
            for j in 0..branches.len() {
                if i == j {
                    continue;
                }
                assert!(
                    inside_fraction(&branches[i], &branches[j])
                        <= params.overlap_inside_fraction
                );
            }
        }
    }
}
