use crate::geom::Cuboid;
use nalgebra::Vector3;
use serde::Serialize;

/// A cylindrical branch estimate.
///
/// During extraction this is a candidate being refined; in the final result
/// it is a skeleton node whose `parent` link (if any) points at the next
/// branch towards the ground.
#[derive(Clone, Debug, Serialize)]
pub struct Branch {
    /// Cylinder centre.
    pub centre: Vector3<f64>,
    /// Unit axis, oriented so the z component is non-negative after the
    /// first pose estimate.
    pub direction: Vector3<f64>,
    /// Cylinder radius.
    pub radius: f64,
    /// Cylinder length along `direction`.
    pub length: f64,
    /// Residual-weighted support count; higher means a crisper fit.
    pub score: f64,
    /// False once the candidate has been discarded.
    pub active: bool,
    /// Set when the skeleton search has finalized this node.
    pub visited: bool,
    /// Index of the parent branch in the result list, towards the ground.
    pub parent: Option<usize>,
    /// Path length to the ground along parent links.
    pub distance_to_ground: f64,
    /// Accumulated angle-penalized cost of the path to the ground.
    pub tree_score: f64,
}

impl Branch {
    /// A fresh vertical candidate awaiting refinement.
    pub fn seed(centre: Vector3<f64>, radius: f64, length: f64) -> Self {
        Self {
            centre,
            direction: Vector3::z(),
            radius,
            length,
            score: 0.0,
            active: true,
            visited: false,
            parent: None,
            distance_to_ground: f64::INFINITY,
            tree_score: f64::INFINITY,
        }
    }

    /// Lower end of the cylinder axis.
    pub fn base(&self) -> Vector3<f64> {
        self.centre - self.direction * (0.5 * self.length)
    }

    /// Upper end of the cylinder axis.
    pub fn tip(&self) -> Vector3<f64> {
        self.centre + self.direction * (0.5 * self.length)
    }

    /// Volume proxy (radius² · length) used to keep the larger of two
    /// duplicate cylinders.
    pub fn volume(&self) -> f64 {
        self.radius * self.radius * self.length
    }

    /// Axis-aligned bounds of the cylinder.
    pub fn bounding_cuboid(&self) -> Cuboid {
        let base = self.base();
        let tip = self.tip();
        let pad = Vector3::repeat(self.radius);
        Cuboid::new(base.inf(&tip) - pad, base.sup(&tip) + pad)
    }

    /// Signed height of a point along the axis, relative to the centre.
    pub fn height_of(&self, pos: &Vector3<f64>) -> f64 {
        (pos - self.centre).dot(&self.direction)
    }

    /// Distance of a point from the cylinder axis.
    pub fn radial_distance(&self, pos: &Vector3<f64>) -> f64 {
        let rel = pos - self.centre;
        let h = rel.dot(&self.direction);
        (rel - self.direction * h).norm()
    }

    /// True when the point lies inside the finite cylinder volume.
    pub fn contains(&self, pos: &Vector3<f64>) -> bool {
        let rel = pos - self.centre;
        let h = rel.dot(&self.direction);
        if h.abs() > 0.5 * self.length {
            return false;
        }
        let radial = rel - self.direction * h;
        radial.norm_squared() < self.radius * self.radius
    }
}

/// Output of the extraction pipeline: branches connected into rooted trees.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SkeletonResult {
    /// Surviving branches. `parent` indices refer to this list.
    pub branches: Vec<Branch>,
    /// Indices of branches that anchor a tree (no parent of their own).
    pub roots: Vec<usize>,
    /// Cell width of the finest seeding voxelization.
    pub voxel_width: f64,
    /// Estimated nearest-neighbour spacing of the input points.
    pub point_spacing: f64,
    /// End-to-end extraction time.
    pub latency_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cylinder_membership() {
        let branch = Branch::seed(Vector3::new(1.0, 2.0, 3.0), 0.1, 0.8);
        assert!(branch.contains(&Vector3::new(1.05, 2.0, 3.2)));
        // outside radially
        assert!(!branch.contains(&Vector3::new(1.15, 2.0, 3.0)));
        // outside axially
        assert!(!branch.contains(&Vector3::new(1.0, 2.0, 3.5)));
    }

    #[test]
    fn base_and_tip_span_the_axis() {
        let branch = Branch::seed(Vector3::zeros(), 0.05, 0.4);
        assert_eq!(branch.base(), Vector3::new(0.0, 0.0, -0.2));
        assert_eq!(branch.tip(), Vector3::new(0.0, 0.0, 0.2));
    }

    #[test]
    fn bounding_cuboid_covers_tilted_cylinder() {
        let mut branch = Branch::seed(Vector3::zeros(), 0.1, 1.0);
        branch.direction = Vector3::new(1.0, 0.0, 1.0).normalize();
        let cuboid = branch.bounding_cuboid();
        assert!(cuboid.contains(&branch.base()));
        assert!(cuboid.contains(&branch.tip()));
        assert!(cuboid.contains(&Vector3::new(0.0, 0.09, 0.0)));
    }
}
