use branch_detector::config::extract::{self, ExtractConfig};
use branch_detector::diagnostics::ExtractionReport;
use branch_detector::io::{load_ascii_cloud, save_branch_bases, write_json_file};
use branch_detector::BranchDetector;
use std::env;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let program = env::args()
        .next()
        .unwrap_or_else(|| "extract_demo".to_string());
    let config = extract::parse_cli(&program)?;

    let cloud = load_ascii_cloud(&config.input_path)?;
    let detector = BranchDetector::new(config.params.clone());
    let report = detector.extract_with_diagnostics(&cloud);

    print_text_summary(&config, &report);

    if let Some(path) = &config.output.json_out {
        write_json_file(path, &report)?;
        println!("\nJSON report written to {}", path.display());
    }

    if let Some(path) = &config.output.bases_out {
        save_branch_bases(path, &report.result.branches)?;
        println!("Branch bases written to {}", path.display());
    }

    Ok(())
}

fn print_text_summary(config: &ExtractConfig, report: &ExtractionReport) {
    let res = &report.result;
    println!("Extraction summary for {}", config.input_path.display());
    println!("  branches: {}", res.branches.len());
    println!("  trees: {}", res.roots.len());
    println!("  point_spacing: {:.4}", res.point_spacing);
    println!("  latency_ms: {:.3}", res.latency_ms);

    let diag = &report.diagnostics;
    if let Some(input) = &diag.input {
        println!(
            "\nInput: {} points ({} bounded), voxel width {:.3}",
            input.point_count, input.bounded_count, input.voxel_width
        );
    }
    if let Some(seed) = &diag.seed {
        println!(
            "Seeding: {} candidates from {} occupied cells ({:.3} ms)",
            seed.candidates, seed.occupied_cells, seed.elapsed_ms
        );
    }
    if let Some(refine) = &diag.refine {
        let survivors = refine
            .active_per_iteration
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        println!(
            "Refinement: {} iterations, active {survivors}, {} scored ({:.3} ms)",
            refine.iterations, refine.scored, refine.elapsed_ms
        );
    }
    if let Some(prune) = &diag.prune {
        println!(
            "Pruning: {} scored -> {} above threshold -> {} kept ({} duplicates, {:.3} ms)",
            prune.scored_input,
            prune.kept_after_score,
            prune.kept,
            prune.duplicates_removed,
            prune.elapsed_ms
        );
    }
    if let Some(skeleton) = &diag.skeleton {
        println!(
            "Skeleton: {} seeded roots, {} trees, {} visited, {} unreached ({:.3} ms)",
            skeleton.seeded_roots,
            skeleton.tree_roots,
            skeleton.visited,
            skeleton.unreached,
            skeleton.elapsed_ms
        );
    }

    let top: Vec<&branch_detector::Branch> = {
        let mut sorted: Vec<_> = res.branches.iter().collect();
        sorted.sort_by(|a, b| b.score.total_cmp(&a.score));
        sorted.into_iter().take(5).collect()
    };
    if !top.is_empty() {
        println!("\nStrongest branches:");
        for branch in top {
            println!(
                "  r={:.3} l={:.3} score={:.1} at [{:.2}, {:.2}, {:.2}]",
                branch.radius,
                branch.length,
                branch.score,
                branch.centre.x,
                branch.centre.y,
                branch.centre.z
            );
        }
    }
}
