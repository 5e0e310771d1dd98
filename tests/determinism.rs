mod common;

use branch_detector::cloud::RayCloud;
use branch_detector::{BranchDetector, BranchParams};
use common::synthetic_cloud::cylinder_shell;
use nalgebra::Vector3;

#[test]
fn repeated_extraction_is_bit_identical() {
    let _ = env_logger::builder().is_test(true).try_init();
    let points = cylinder_shell(Vector3::zeros(), Vector3::z(), 0.05, 0.5, 0.02);

    let detector = BranchDetector::new(BranchParams::default());
    let first = detector.extract(&RayCloud::from_points(points.clone()));
    let second = detector.extract(&RayCloud::from_points(points));

    let a = serde_json::to_string(&first.branches).expect("serializable branches");
    let b = serde_json::to_string(&second.branches).expect("serializable branches");
    assert_eq!(a, b, "two runs over the same cloud must agree bit for bit");
    assert_eq!(first.roots, second.roots);
    assert_eq!(first.voxel_width, second.voxel_width);
    assert_eq!(first.point_spacing, second.point_spacing);
}
