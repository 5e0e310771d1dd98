//! The cloud seam: the detector reads points through [`PointCloudView`].
//!
//! A ray cloud stores one end point per ray together with a bounded flag;
//! unbounded rays (no return within range) keep their position but carry no
//! surface evidence and are skipped by every stage.

use crate::knn;
use nalgebra::Vector3;

pub trait PointCloudView {
    /// Total number of rays, bounded or not.
    fn point_count(&self) -> usize;

    /// End point of one ray.
    fn end_point(&self, index: usize) -> Vector3<f64>;

    /// True when the ray hit a surface at its end point.
    fn is_bounded(&self, index: usize) -> bool;

    fn bounded_points(&self) -> BoundedPoints<'_, Self>
    where
        Self: Sized,
    {
        BoundedPoints {
            cloud: self,
            index: 0,
        }
    }

    /// Componentwise minimum over bounded end points.
    fn min_bound(&self) -> Vector3<f64>
    where
        Self: Sized,
    {
        self.bounded_points()
            .fold(Vector3::repeat(f64::INFINITY), |acc, (_, p)| acc.inf(&p))
    }

    /// Componentwise maximum over bounded end points.
    fn max_bound(&self) -> Vector3<f64>
    where
        Self: Sized,
    {
        self.bounded_points()
            .fold(Vector3::repeat(f64::NEG_INFINITY), |acc, (_, p)| acc.sup(&p))
    }

    /// Typical nearest-neighbour distance between bounded end points.
    fn estimate_point_spacing(&self) -> f64
    where
        Self: Sized,
    {
        let points: Vec<Vector3<f64>> = self.bounded_points().map(|(_, p)| p).collect();
        knn::estimate_spacing(&points)
    }
}

pub struct BoundedPoints<'a, C: ?Sized + PointCloudView> {
    cloud: &'a C,
    index: usize,
}

impl<'a, C: PointCloudView> Iterator for BoundedPoints<'a, C> {
    type Item = (usize, Vector3<f64>);

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.cloud.point_count() {
            let index = self.index;
            self.index += 1;
            if self.cloud.is_bounded(index) {
                return Some((index, self.cloud.end_point(index)));
            }
        }
        None
    }
}

/// An owned ray cloud.
#[derive(Clone, Debug, Default)]
pub struct RayCloud {
    ends: Vec<Vector3<f64>>,
    bounded: Vec<bool>,
}

impl RayCloud {
    /// Build from end points and per-ray bounded flags.
    pub fn new(ends: Vec<Vector3<f64>>, bounded: Vec<bool>) -> Self {
        debug_assert_eq!(ends.len(), bounded.len());
        Self { ends, bounded }
    }

    /// Build from points that are all surface returns.
    pub fn from_points(ends: Vec<Vector3<f64>>) -> Self {
        let bounded = vec![true; ends.len()];
        Self { ends, bounded }
    }

    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }
}

impl PointCloudView for RayCloud {
    fn point_count(&self) -> usize {
        self.ends.len()
    }

    fn end_point(&self, index: usize) -> Vector3<f64> {
        self.ends[index]
    }

    fn is_bounded(&self, index: usize) -> bool {
        self.bounded[index]
    }
}
