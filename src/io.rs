//! Text-format persistence: branch base lists and a small cloud reader.

use crate::cloud::RayCloud;
use crate::types::Branch;
use nalgebra::Vector3;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

const BASE_LIST_HEADER: &str = "# Tree base location list: x, y, z, radius";

/// One record of the branch base list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BranchBase {
    /// Lower end of the branch cylinder.
    pub position: Vector3<f64>,
    pub radius: f64,
}

/// Write the surviving branch bases as `x, y, z, radius` lines.
///
/// Values use the shortest round-trippable decimal form, so a reload
/// reproduces them exactly.
pub fn save_branch_bases(path: &Path, branches: &[Branch]) -> Result<(), String> {
    let file = fs::File::create(path)
        .map_err(|e| format!("Failed to create {}: {e}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{BASE_LIST_HEADER}")
        .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
    for branch in branches.iter().filter(|b| b.active) {
        let base = branch.base();
        writeln!(out, "{}, {}, {}, {}", base.x, base.y, base.z, branch.radius)
            .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
    }
    out.flush()
        .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
    Ok(())
}

/// Read a branch base list written by [`save_branch_bases`].
///
/// Blank lines and `#` comments are skipped. Any other line must hold
/// exactly four comma-separated numbers; one malformed line rejects the
/// whole file.
pub fn load_branch_bases(path: &Path) -> Result<Vec<BranchBase>, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let mut bases = Vec::new();
    for (line_index, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 4 {
            return Err(format!(
                "{}:{}: expected `x, y, z, radius`, found {} fields",
                path.display(),
                line_index + 1,
                fields.len()
            ));
        }
        let mut values = [0.0f64; 4];
        for (value, field) in values.iter_mut().zip(&fields) {
            *value = field.trim().parse().map_err(|e| {
                format!(
                    "{}:{}: bad number {:?}: {e}",
                    path.display(),
                    line_index + 1,
                    field.trim()
                )
            })?;
        }
        bases.push(BranchBase {
            position: Vector3::new(values[0], values[1], values[2]),
            radius: values[3],
        });
    }
    Ok(bases)
}

/// Read a plain text cloud: one point per line, coordinates separated by
/// whitespace or commas, `#` comments allowed. Extra columns beyond x, y, z
/// (intensity, colour) are ignored.
pub fn load_ascii_cloud(path: &Path) -> Result<RayCloud, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let mut points = Vec::new();
    for (line_index, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty());
        let mut coords = [0.0f64; 3];
        for (axis, value) in coords.iter_mut().enumerate() {
            let field = fields.next().ok_or_else(|| {
                format!(
                    "{}:{}: expected 3 coordinates, found {axis}",
                    path.display(),
                    line_index + 1
                )
            })?;
            *value = field.parse().map_err(|e| {
                format!(
                    "{}:{}: bad number {field:?}: {e}",
                    path.display(),
                    line_index + 1
                )
            })?;
        }
        points.push(Vector3::new(coords[0], coords[1], coords[2]));
    }
    Ok(RayCloud::from_points(points))
}

/// Serialize a value as pretty JSON to a file.
pub fn write_json_file<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON: {e}"))?;
    fs::write(path, json).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}
