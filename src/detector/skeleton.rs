//! Ground-to-canopy skeleton assembly.
//!
//! Surviving branches become nodes of a k-nearest-neighbour graph. Branches
//! that pass the root test seed a priority-queue search ordered by an
//! accumulated cost whose edge term penalizes connections that disagree
//! with the branch directions. Each captured node records its parent,
//! defining a forest with one tree per surviving root.

use super::params::SkeletonParams;
use crate::knn::{self, Neighbour};
use crate::types::Branch;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Outcome counts of the skeleton stage.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SkeletonSummary {
    /// Branches that passed the root test and seeded the search.
    pub seeded_roots: usize,
    /// Branches finalized by the search.
    pub visited: usize,
    /// Branches no path reached; they keep `parent = None` but are not
    /// roots of any tree.
    pub unreached: usize,
}

/// Priority-queue entry. Ordered as a min-heap on the accumulated cost.
#[derive(Clone, Copy, Debug)]
struct QueueNode {
    tree_score: f64,
    distance_to_ground: f64,
    id: usize,
}

impl PartialEq for QueueNode {
    fn eq(&self, other: &Self) -> bool {
        self.tree_score == other.tree_score
    }
}

impl Eq for QueueNode {}

impl PartialOrd for QueueNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed so the BinaryHeap pops the lowest cost first
        other
            .tree_score
            .partial_cmp(&self.tree_score)
            .unwrap_or(Ordering::Equal)
    }
}

/// Indices of branches not shaded from below by any other branch.
///
/// Branch `i` is rejected as a root when some other branch `j` satisfies
/// `h_i > d²/(2·h_j)`, with heights measured above the cloud floor and `d`
/// the horizontal distance. The test is a heuristic cone of influence, so
/// only branches horizontally clear of everything else anchor a tree.
pub(crate) fn root_candidates(branches: &[Branch], floor_z: f64) -> Vec<usize> {
    (0..branches.len())
        .filter(|&i| {
            let height_i = branches[i].centre.z - floor_z;
            !(0..branches.len()).any(|j| {
                if j == i {
                    return false;
                }
                let rel = branches[j].centre - branches[i].centre;
                let d2 = rel.x * rel.x + rel.y * rel.y;
                let height_j = branches[j].centre.z - floor_z;
                height_j > 0.0 && height_i > d2 / (2.0 * height_j)
            })
        })
        .collect()
}

/// Connect branches into rooted trees.
///
/// Fills in `parent`, `distance_to_ground`, `tree_score` and `visited` on
/// every reached branch, and returns the indices of the branches that
/// anchor a tree together with the stage summary.
pub(crate) fn build_skeleton(
    branches: &mut [Branch],
    floor_z: f64,
    params: &SkeletonParams,
) -> (Vec<usize>, SkeletonSummary) {
    let seeded = root_candidates(branches, floor_z);
    let mut heap: BinaryHeap<QueueNode> = BinaryHeap::new();
    for &id in &seeded {
        let height = branches[id].centre.z - floor_z;
        branches[id].distance_to_ground = height;
        branches[id].tree_score = height * height;
        heap.push(QueueNode {
            tree_score: branches[id].tree_score,
            distance_to_ground: branches[id].distance_to_ground,
            id,
        });
    }

    let centres: Vec<_> = branches.iter().map(|b| b.centre).collect();
    let graph = knn::nearest_neighbours(&centres, params.search_size);

    let mut visited = 0usize;
    while let Some(node) = heap.pop() {
        if branches[node.id].visited {
            continue;
        }
        for neighbour in &graph[node.id] {
            relax_edge(branches, &mut heap, &node, neighbour, params);
        }
        branches[node.id].visited = true;
        visited += 1;
    }

    let roots: Vec<usize> = seeded
        .iter()
        .copied()
        .filter(|&id| branches[id].parent.is_none())
        .collect();
    let summary = SkeletonSummary {
        seeded_roots: seeded.len(),
        visited,
        unreached: branches.len() - visited,
    };
    (roots, summary)
}

/// Offer `node` as the parent of one graph neighbour.
///
/// Edge cost is the squared distance divided by the squared alignment
/// between the connection vector and the (sign-agreed) mean of the two
/// branch directions, clamped from below so perpendicular connections stay
/// finite rather than free.
fn relax_edge(
    branches: &mut [Branch],
    heap: &mut BinaryHeap<QueueNode>,
    node: &QueueNode,
    neighbour: &Neighbour,
    params: &SkeletonParams,
) {
    let child = neighbour.index;
    if branches[child].visited {
        return;
    }
    let link = branches[child].centre - branches[node.id].centre;
    let link_unit = link / neighbour.dist2.sqrt();

    let dir = branches[node.id].direction;
    let mut dir2 = branches[child].direction;
    if dir2.dot(&dir) < 0.0 {
        dir2 = -dir2;
    }
    let mean_dir = (dir + dir2).normalize();

    let alignment = link_unit.dot(&mean_dir).max(params.alignment_floor);
    let cost = neighbour.dist2 / alignment.powi(params.alignment_power);

    let tree_score = node.tree_score + cost;
    if tree_score < branches[child].tree_score {
        let distance_to_ground = node.distance_to_ground + neighbour.dist2.sqrt();
        branches[child].tree_score = tree_score;
        branches[child].distance_to_ground = distance_to_ground;
        branches[child].parent = Some(node.id);
        heap.push(QueueNode {
            tree_score,
            distance_to_ground,
            id: child,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn branch_at(centre: Vector3<f64>, direction: Vector3<f64>) -> Branch {
        let mut b = Branch::seed(centre, 0.05, 0.4);
        b.direction = direction.normalize();
        b.score = 80.0;
        b
    }

    #[test]
    fn isolated_branches_are_roots() {
        let branches = vec![
            branch_at(Vector3::new(0.0, 0.0, 0.3), Vector3::z()),
            branch_at(Vector3::new(10.0, 0.0, 0.3), Vector3::z()),
        ];
        assert_eq!(root_candidates(&branches, 0.0), vec![0, 1]);
    }

    #[test]
    fn shading_is_mutual_for_close_branches() {
        // horizontal separation below sqrt(2 h_i h_j) rejects both
        let branches = vec![
            branch_at(Vector3::new(0.0, 0.0, 0.5), Vector3::z()),
            branch_at(Vector3::new(0.3, 0.0, 0.8), Vector3::z()),
        ];
        assert!(root_candidates(&branches, 0.0).is_empty());
    }

    #[test]
    fn floor_level_branches_neither_shade_nor_get_shaded() {
        let branches = vec![
            branch_at(Vector3::new(0.0, 0.0, 0.0), Vector3::z()),
            branch_at(Vector3::new(0.1, 0.0, 0.4), Vector3::z()),
        ];
        // branch 0 sits on the floor: zero height defeats both sides of
        // the shading inequality, so both branches stay roots
        assert_eq!(root_candidates(&branches, 0.0), vec![0, 1]);
    }

    #[test]
    fn root_captures_a_nearby_shaded_pair() {
        // two mutually shading branches above a clear root: the search
        // reaches both through the root
        let mut branches = vec![
            branch_at(Vector3::new(0.0, 0.0, 0.2), Vector3::z()),
            branch_at(Vector3::new(3.0, 0.0, 1.0), Vector3::z()),
            branch_at(Vector3::new(3.0, 0.1, 1.5), Vector3::z()),
        ];
        let (roots, summary) = build_skeleton(&mut branches, 0.0, &SkeletonParams::default());
        assert_eq!(roots, vec![0]);
        assert_eq!(summary.seeded_roots, 1);
        assert_eq!(summary.visited, 3);
        assert_eq!(summary.unreached, 0);
        assert!(branches[1].parent.is_some());
        assert!(branches[2].parent.is_some());
        // both paths terminate at the root
        for start in 1..3 {
            let mut id = start;
            let mut hops = 0;
            while let Some(parent) = branches[id].parent {
                id = parent;
                hops += 1;
                assert!(hops <= branches.len());
            }
            assert_eq!(id, 0);
        }
    }

    #[test]
    fn misaligned_far_roots_stay_separate_trees() {
        // the angle penalty makes the horizontal hop between the two
        // vertical branches far more expensive than their seed scores
        let mut branches = vec![
            branch_at(Vector3::new(0.0, 0.0, 0.4), Vector3::z()),
            branch_at(Vector3::new(8.0, 0.0, 0.4), Vector3::z()),
        ];
        let (roots, summary) = build_skeleton(&mut branches, 0.0, &SkeletonParams::default());
        assert_eq!(roots, vec![0, 1]);
        assert_eq!(summary.seeded_roots, 2);
        assert!(branches[0].parent.is_none());
        assert!(branches[1].parent.is_none());
    }

    #[test]
    fn captured_parents_are_locally_optimal() {
        let mut branches = vec![
            branch_at(Vector3::new(0.0, 0.0, 0.2), Vector3::z()),
            branch_at(Vector3::new(2.5, 0.0, 0.9), Vector3::new(0.3, 0.0, 1.0)),
            branch_at(Vector3::new(2.5, 0.2, 1.4), Vector3::z()),
            branch_at(Vector3::new(2.7, 0.0, 1.9), Vector3::z()),
        ];
        let params = SkeletonParams::default();
        let (_, _) = build_skeleton(&mut branches, 0.0, &params);

        let centres: Vec<_> = branches.iter().map(|b| b.centre).collect();
        let graph = knn::nearest_neighbours(&centres, params.search_size);
        let mut unclamped = 0usize;
        for (id, neighbours) in graph.iter().enumerate() {
            if branches[id].parent.is_none() {
                continue;
            }
            for neighbour in neighbours {
                // `other` as prospective parent of `id`: the link runs
                // parent to child, exactly as the relaxation computes it
                let other = &branches[neighbour.index];
                let link = branches[id].centre - other.centre;
                let link_unit = link / neighbour.dist2.sqrt();
                let mut dir2 = branches[id].direction;
                if dir2.dot(&other.direction) < 0.0 {
                    dir2 = -dir2;
                }
                let mean_dir = (other.direction + dir2).normalize();
                let alignment = link_unit.dot(&mean_dir).max(params.alignment_floor);
                if alignment > params.alignment_floor {
                    unclamped += 1;
                }
                let via = other.tree_score + neighbour.dist2 / alignment.powi(params.alignment_power);
                assert!(
                    branches[id].tree_score <= via + 1e-9,
                    "branch {id} found a cheaper path via {}",
                    neighbour.index
                );
            }
        }
        assert!(
            unclamped > 0,
            "optimality check must see edges whose alignment is not floor-clamped"
        );
    }
}
