use nalgebra::Vector3;

/// Generates a cylindrical shell of lattice points.
///
/// `spacing` sets both the ring pitch along the axis and the arc step around
/// it. The layout is a fixed lattice with no randomness, so repeated calls
/// produce the identical cloud.
pub fn cylinder_shell(
    base: Vector3<f64>,
    axis: Vector3<f64>,
    radius: f64,
    length: f64,
    spacing: f64,
) -> Vec<Vector3<f64>> {
    assert!(radius > 0.0 && length > 0.0, "cylinder size must be positive");
    assert!(spacing > 0.0, "point spacing must be positive");

    let axis = axis.normalize();
    let seed = if axis.z.abs() < 0.9 {
        Vector3::z()
    } else {
        Vector3::x()
    };
    let ax1 = seed.cross(&axis).normalize();
    let ax2 = axis.cross(&ax1);

    let stations = ((length / spacing).round() as usize).max(1) + 1;
    let per_ring = ((std::f64::consts::TAU * radius / spacing).round() as usize).max(3);

    let mut points = Vec::with_capacity(stations * per_ring);
    for station in 0..stations {
        let h = length * station as f64 / (stations - 1) as f64;
        for s in 0..per_ring {
            let theta = std::f64::consts::TAU * s as f64 / per_ring as f64;
            let radial = ax1 * theta.cos() + ax2 * theta.sin();
            points.push(base + axis * h + radial * radius);
        }
    }
    points
}
