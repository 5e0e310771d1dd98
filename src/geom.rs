//! Small geometric primitives shared by the extraction stages.

use nalgebra::Vector3;

/// Axis-aligned box used for broad-phase overlap tests and grid range
/// queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cuboid {
    pub min_bound: Vector3<f64>,
    pub max_bound: Vector3<f64>,
}

impl Cuboid {
    pub fn new(min_bound: Vector3<f64>, max_bound: Vector3<f64>) -> Self {
        Self {
            min_bound,
            max_bound,
        }
    }

    /// True when the point lies inside or on the boundary.
    pub fn contains(&self, pos: &Vector3<f64>) -> bool {
        pos >= &self.min_bound && pos <= &self.max_bound
    }

    /// True when the boxes share any volume. Touching faces count.
    pub fn overlaps(&self, other: &Cuboid) -> bool {
        self.min_bound <= other.max_bound && self.max_bound >= other.min_bound
    }
}

/// Two unit vectors spanning the plane perpendicular to `dir`.
///
/// The anchor vector is fixed so repeated calls with the same direction give
/// the same frame.
pub fn perpendicular_axes(dir: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let ax1 = Vector3::new(1.0, 2.0, 3.0).cross(dir).normalize();
    let ax2 = dir.cross(&ax1);
    (ax1, ax2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn contains_includes_boundary() {
        let cuboid = Cuboid::new(Vector3::zeros(), Vector3::repeat(1.0));
        assert!(cuboid.contains(&Vector3::new(0.5, 0.5, 0.5)));
        assert!(cuboid.contains(&Vector3::new(0.0, 1.0, 0.5)));
        assert!(!cuboid.contains(&Vector3::new(0.5, 0.5, 1.1)));
        assert!(!cuboid.contains(&Vector3::new(-0.1, 0.5, 0.5)));
    }

    #[test]
    fn overlap_is_symmetric_and_touching_counts() {
        let a = Cuboid::new(Vector3::zeros(), Vector3::repeat(1.0));
        let b = Cuboid::new(Vector3::repeat(0.5), Vector3::repeat(2.0));
        let c = Cuboid::new(Vector3::repeat(1.0), Vector3::repeat(2.0));
        let d = Cuboid::new(Vector3::repeat(1.5), Vector3::repeat(2.0));
        assert!(a.overlaps(&b) && b.overlaps(&a));
        assert!(a.overlaps(&c));
        assert!(!a.overlaps(&d));
    }

    #[test]
    fn perpendicular_axes_form_a_frame() {
        let dir = Vector3::new(0.3, -0.4, 0.86).normalize();
        let (ax1, ax2) = perpendicular_axes(&dir);
        assert!(approx_eq(ax1.norm(), 1.0, 1e-12));
        assert!(approx_eq(ax2.norm(), 1.0, 1e-12));
        assert!(approx_eq(ax1.dot(&dir), 0.0, 1e-12));
        assert!(approx_eq(ax2.dot(&dir), 0.0, 1e-12));
        assert!(approx_eq(ax1.dot(&ax2), 0.0, 1e-12));
    }
}
