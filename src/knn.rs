//! K-nearest-neighbour queries over point sets, backed by a k-d tree.

use std::num::NonZero;

use kiddo::{ImmutableKdTree, SquaredEuclidean};
use nalgebra::Vector3;

/// One neighbour of a query point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbour {
    /// Index into the point set the tree was built from.
    pub index: usize,
    /// Squared euclidean distance to the query point.
    pub dist2: f64,
}

// The immutable tree accepts any number of points sharing a coordinate
// value, which flat ground returns do; the bucketed mutable tree caps that
// at its bucket size. Each point set here is built once and only queried.
fn build_tree(points: &[Vector3<f64>]) -> ImmutableKdTree<f64, 3> {
    let entries: Vec<[f64; 3]> = points.iter().map(|p| [p.x, p.y, p.z]).collect();
    ImmutableKdTree::new_from_slice(&entries)
}

/// For every point, its `k` nearest other points, closest first.
///
/// The point itself is excluded even when other points share its exact
/// position. Lists are shorter than `k` when the set is small.
pub fn nearest_neighbours(points: &[Vector3<f64>], k: usize) -> Vec<Vec<Neighbour>> {
    if points.is_empty() {
        return Vec::new();
    }
    let tree = build_tree(points);
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            tree.nearest_n::<SquaredEuclidean>(&[p.x, p.y, p.z], NonZero::new(k + 1).unwrap())
                .into_iter()
                .filter(|n| n.item as usize != i)
                .take(k)
                .map(|n| Neighbour {
                    index: n.item as usize,
                    dist2: n.distance,
                })
                .collect()
        })
        .collect()
}

/// Mean nearest-neighbour distance over a bounded sample of the points.
///
/// Returns 1.0 for degenerate inputs so downstream tolerances stay finite.
pub fn estimate_spacing(points: &[Vector3<f64>]) -> f64 {
    const MAX_SAMPLES: usize = 1000;
    if points.len() < 2 {
        return 1.0;
    }
    let tree = build_tree(points);
    let step = (points.len() / MAX_SAMPLES).max(1);
    let mut total = 0.0;
    let mut count = 0usize;
    for p in points.iter().step_by(step) {
        let neighbours = tree.nearest_n::<SquaredEuclidean>(&[p.x, p.y, p.z], NonZero::new(2).unwrap());
        if neighbours.len() >= 2 {
            total += neighbours[1].distance.sqrt();
            count += 1;
        }
    }
    if count > 0 {
        total / count as f64
    } else {
        1.0
    }
}
