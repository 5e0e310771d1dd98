use branch_detector::cloud::RayCloud;
use branch_detector::{BranchDetector, BranchParams};
use nalgebra::Vector3;

fn main() {
    // Demo stub: runs the detector on a synthetic vertical cylinder shell
    let radius = 0.05;
    let length = 0.5;
    let spacing = 0.02;
    let mut points = Vec::new();
    let rings = (length / spacing) as usize;
    let per_ring = (std::f64::consts::TAU * radius / spacing).ceil() as usize;
    for ring in 0..rings {
        let z = length * ring as f64 / (rings - 1) as f64;
        for s in 0..per_ring {
            let theta = std::f64::consts::TAU * s as f64 / per_ring as f64;
            points.push(Vector3::new(
                radius * theta.cos(),
                radius * theta.sin(),
                z,
            ));
        }
    }
    let cloud = RayCloud::from_points(points);

    let detector = BranchDetector::new(BranchParams::default());
    let result = detector.extract(&cloud);
    println!(
        "branches={} trees={} latency_ms={:.3}",
        result.branches.len(),
        result.roots.len(),
        result.latency_ms
    );
}
