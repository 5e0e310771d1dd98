//! Debug-draw batches for an external visualization sink.
//!
//! The sink contract is parallel arrays: one entry per primitive, colours
//! as RGBA in `[0, 1]`. Nothing here performs any rendering; the batches
//! are handed to whatever viewer the caller wires up.

use crate::types::Branch;

/// Cylinder primitives for the surviving branches.
#[derive(Clone, Debug, Default)]
pub struct CylinderBatch {
    pub starts: Vec<[f64; 3]>,
    pub ends: Vec<[f64; 3]>,
    pub radii: Vec<f64>,
    pub colours: Vec<[f64; 4]>,
}

impl CylinderBatch {
    pub fn len(&self) -> usize {
        self.radii.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }
}

/// One semi-transparent cylinder per active branch, shaded by score.
///
/// Shade saturates at twice the acceptance score; branches past the
/// halfway shade get a blue tint so marginal and confident fits are
/// distinguishable at a glance.
pub fn cylinder_batch(branches: &[Branch], min_score: f64) -> CylinderBatch {
    let mut batch = CylinderBatch::default();
    for branch in branches.iter().filter(|b| b.active) {
        let shade = (branch.score / (2.0 * min_score)).min(1.0);
        batch.starts.push(branch.base().into());
        batch.ends.push(branch.tip().into());
        batch.radii.push(branch.radius);
        batch.colours.push([
            shade,
            shade,
            if shade > 0.5 { 1.0 } else { 0.0 },
            0.5,
        ]);
    }
    batch
}

/// Line primitives for the parent links of the skeleton.
#[derive(Clone, Debug, Default)]
pub struct LineBatch {
    pub starts: Vec<[f64; 3]>,
    pub ends: Vec<[f64; 3]>,
    pub colours: Vec<[f64; 3]>,
}

impl LineBatch {
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }
}

/// One line per parent link, coloured by the accumulated tree score so
/// each tree's path structure stands out from its neighbours.
pub fn skeleton_lines(branches: &[Branch]) -> LineBatch {
    let mut batch = LineBatch::default();
    for branch in branches {
        let Some(parent) = branch.parent else {
            continue;
        };
        batch.starts.push(branch.centre.into());
        batch.ends.push(branches[parent].centre.into());
        batch.colours.push([
            branch.tree_score.fract(),
            (branch.tree_score / 10.0).fract(),
            (branch.tree_score / 100.0).fract(),
        ]);
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn shade_saturates_and_tints() {
        let mut low = Branch::seed(Vector3::zeros(), 0.05, 0.4);
        low.score = 20.0;
        let mut high = Branch::seed(Vector3::new(1.0, 0.0, 0.0), 0.05, 0.4);
        high.score = 500.0;
        let mut inactive = Branch::seed(Vector3::new(2.0, 0.0, 0.0), 0.05, 0.4);
        inactive.score = 500.0;
        inactive.active = false;

        let batch = cylinder_batch(&[low, high, inactive], 40.0);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.colours[0], [0.25, 0.25, 0.0, 0.5]);
        assert_eq!(batch.colours[1], [1.0, 1.0, 1.0, 0.5]);
    }

    #[test]
    fn only_parented_branches_draw_lines() {
        let mut root = Branch::seed(Vector3::zeros(), 0.05, 0.4);
        root.tree_score = 0.04;
        let mut child = Branch::seed(Vector3::new(0.0, 0.0, 0.5), 0.05, 0.4);
        child.parent = Some(0);
        child.tree_score = 12.5;

        let batch = skeleton_lines(&[root, child]);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.starts[0], [0.0, 0.0, 0.5]);
        assert_eq!(batch.ends[0], [0.0, 0.0, 0.0]);
        assert_eq!(batch.colours[0], [0.5, 0.25, 0.125]);
    }
}
