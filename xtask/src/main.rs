use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "synchro workspace automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the primitives against their std counterparts
    Bench {
        /// Run quickly (lower sample size/time)
        #[arg(long, default_value_t = false)]
        quick: bool,

        /// Generate report only (skip running benchmarks)
        #[arg(long, default_value_t = false)]
        report_only: bool,

        /// Enable the `tracing` feature while benchmarking
        #[arg(long, default_value_t = false)]
        tracing: bool,
    },
}

const BENCH: &str = "sync_benchmark";
/// Functions whose name starts with this prefix are the baseline of their group.
const BASELINE_PREFIX: &str = "std_";

#[derive(Deserialize)]
struct Estimates {
    mean: Estimate,
}

#[derive(Deserialize)]
struct Estimate {
    point_estimate: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench {
            quick,
            report_only,
            tracing,
        } => {
            if !report_only {
                run_benchmarks(quick, tracing)?;
            }
            generate_report()?;
        }
    }

    Ok(())
}

fn run_benchmarks(quick: bool, tracing: bool) -> Result<()> {
    println!(">>> Running {BENCH}...");
    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.env("CARGO_INCREMENTAL", "0");
    cmd.args(["bench", "--bench", BENCH]);
    if tracing {
        cmd.args(["--features", "tracing"]);
    }

    // Args for the test runner (Criterion) go after --
    cmd.arg("--");
    if quick {
        cmd.args(["--measurement-time", "0.1"]);
        cmd.arg("--noplot");
        cmd.args(["--sample-size", "10"]);
    }

    let status = cmd
        .status()
        .with_context(|| format!("failed to run cargo bench for {BENCH}"))?;
    if !status.success() {
        anyhow::bail!("benchmark {BENCH} failed");
    }
    println!("Finished in {:.2?}", start.elapsed());
    Ok(())
}

/// Mean time per iteration in nanoseconds, keyed by group then function.
type Results = BTreeMap<String, BTreeMap<String, f64>>;

fn generate_report() -> Result<()> {
    println!("\n>>> Generating Report...");
    let criterion_dir = Path::new("target/criterion");
    if !criterion_dir.exists() {
        eprintln!("No criterion output found at {}", criterion_dir.display());
        return Ok(());
    }

    let results = collect_results(criterion_dir)?;

    let report_path = Path::new("benchmark_results/report.md");
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(report_path)?;

    writeln!(file, "# synchro vs std")?;
    writeln!(file)?;
    writeln!(file, "| Group | Function | Mean | Speedup vs std |")?;
    writeln!(file, "|---|---|---|---|")?;

    for (group, functions) in &results {
        let baseline = functions
            .iter()
            .find(|(name, _)| name.starts_with(BASELINE_PREFIX))
            .map(|(_, ns)| *ns);

        for (function, ns) in functions {
            let speedup = match baseline {
                Some(base) if *ns > 0.0 => format!("**{:.2}x**", base / ns),
                _ => "-".to_owned(),
            };
            writeln!(file, "| {group} | {function} | {} | {speedup} |", format_ns(*ns))?;
        }
    }

    println!("Report written to {}", report_path.display());
    Ok(())
}

fn format_ns(ns: f64) -> String {
    if ns >= 1e9 {
        format!("{:.2} s", ns / 1e9)
    } else if ns >= 1e6 {
        format!("{:.2} ms", ns / 1e6)
    } else if ns >= 1e3 {
        format!("{:.2} µs", ns / 1e3)
    } else {
        format!("{ns:.0} ns")
    }
}

/// Reads `target/criterion/<group>/<function>/new/estimates.json`.
fn collect_results(criterion_dir: &Path) -> Result<Results> {
    let mut results = Results::new();

    for group in fs::read_dir(criterion_dir)?.flatten() {
        let group_name = group.file_name().to_string_lossy().into_owned();
        if group_name == "report" || !group.path().is_dir() {
            continue;
        }

        for function in fs::read_dir(group.path())?.flatten() {
            let function_name = function.file_name().to_string_lossy().into_owned();
            let estimates = function.path().join("new").join("estimates.json");
            if function_name == "report" || !estimates.exists() {
                continue;
            }

            let content = fs::read_to_string(&estimates)
                .with_context(|| format!("reading {}", estimates.display()))?;
            let parsed: Estimates = serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", estimates.display()))?;

            results
                .entry(group_name.clone())
                .or_default()
                .insert(function_name, parsed.mean.point_estimate);
        }
    }

    Ok(results)
}
