//! Configuration for the `extract_demo` tool.
//!
//! The tool accepts either a JSON config file or plain flags; flags given
//! alongside a config file override its values.

use crate::detector::BranchParams;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize)]
pub struct ExtractConfig {
    /// Input cloud, one `x y z` point per line.
    pub input_path: PathBuf,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub params: BranchParams,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write the full diagnostics report as JSON.
    pub json_out: Option<PathBuf>,
    /// Write the surviving branch bases as an `x, y, z, radius` list.
    pub bases_out: Option<PathBuf>,
}

/// Load a JSON config file.
pub fn load_config(path: &Path) -> Result<ExtractConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: ExtractConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config)
}

/// Parse the process arguments into a runtime config.
pub fn parse_cli(program: &str) -> Result<ExtractConfig, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args(program, &args)
}

pub(crate) fn parse_args(program: &str, args: &[String]) -> Result<ExtractConfig, String> {
    let mut config: Option<ExtractConfig> = None;
    let mut input: Option<PathBuf> = None;
    let mut json_out: Option<PathBuf> = None;
    let mut bases_out: Option<PathBuf> = None;
    let mut mid_radius: Option<f64> = None;
    let mut verbose = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(usage(program)),
            "--config" => {
                let path = iter
                    .next()
                    .ok_or_else(|| format!("--config needs a path\n{}", usage(program)))?;
                config = Some(load_config(Path::new(path))?);
            }
            "--json-out" => {
                let path = iter
                    .next()
                    .ok_or_else(|| format!("--json-out needs a path\n{}", usage(program)))?;
                json_out = Some(PathBuf::from(path));
            }
            "--save" => {
                let path = iter
                    .next()
                    .ok_or_else(|| format!("--save needs a path\n{}", usage(program)))?;
                bases_out = Some(PathBuf::from(path));
            }
            "--mid-radius" => {
                let value = iter
                    .next()
                    .ok_or_else(|| format!("--mid-radius needs a value\n{}", usage(program)))?;
                let radius: f64 = value
                    .parse()
                    .map_err(|e| format!("Bad --mid-radius {value:?}: {e}"))?;
                if radius <= 0.0 {
                    return Err(format!("--mid-radius must be positive, got {radius}"));
                }
                mid_radius = Some(radius);
            }
            "--verbose" => verbose = true,
            other if other.starts_with('-') => {
                return Err(format!("Unknown flag {other:?}\n{}", usage(program)));
            }
            other => {
                if input.is_some() {
                    return Err(format!("Unexpected argument {other:?}\n{}", usage(program)));
                }
                input = Some(PathBuf::from(other));
            }
        }
    }

    let mut config = match (config, input) {
        (Some(mut config), input) => {
            if let Some(path) = input {
                config.input_path = path;
            }
            config
        }
        (None, Some(path)) => ExtractConfig {
            input_path: path,
            output: OutputConfig::default(),
            params: BranchParams::default(),
        },
        (None, None) => return Err(usage(program)),
    };

    if let Some(path) = json_out {
        config.output.json_out = Some(path);
    }
    if let Some(path) = bases_out {
        config.output.bases_out = Some(path);
    }
    if let Some(radius) = mid_radius {
        config.params.mid_radius = radius;
    }
    if verbose {
        config.params.verbose = true;
    }
    Ok(config)
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {program} <cloud.txt> [--config config.json] [--mid-radius r] \
         [--save bases.txt] [--json-out report.json] [--verbose]"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_cloud_path_uses_defaults() {
        let config = parse_args("extract_demo", &args(&["cloud.txt"])).unwrap();
        assert_eq!(config.input_path, PathBuf::from("cloud.txt"));
        assert_eq!(config.params.mid_radius, 0.1);
        assert!(config.output.json_out.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse_args(
            "extract_demo",
            &args(&[
                "cloud.txt",
                "--mid-radius",
                "0.25",
                "--save",
                "bases.txt",
                "--verbose",
            ]),
        )
        .unwrap();
        assert_eq!(config.params.mid_radius, 0.25);
        assert!(config.params.verbose);
        assert_eq!(config.output.bases_out, Some(PathBuf::from("bases.txt")));
    }

    #[test]
    fn missing_input_shows_usage() {
        let err = parse_args("extract_demo", &args(&["--verbose"])).unwrap_err();
        assert!(err.contains("Usage:"), "{err}");
    }

    #[test]
    fn nonpositive_radius_is_rejected() {
        let err =
            parse_args("extract_demo", &args(&["cloud.txt", "--mid-radius", "-1"])).unwrap_err();
        assert!(err.contains("positive"), "{err}");
    }

    #[test]
    fn unknown_flags_are_rejected() {
        let err = parse_args("extract_demo", &args(&["cloud.txt", "--frobnicate"])).unwrap_err();
        assert!(err.contains("Unknown flag"), "{err}");
    }
}
