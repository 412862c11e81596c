use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

const SAMPLE_PATHS: &str = "crates/fare_core/tests/testdata/paths.csv";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the ride fares workspace",
    long_about = "A unified CLI for pricing sample data, benchmarks,\n\
                  load tests, and CI checks in the ride fares workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a path file with the release binary
    Run {
        /// Path records to price
        #[arg(default_value = SAMPLE_PATHS)]
        input: String,
        /// Fare output file (stdout when omitted)
        output: Option<String>,
        /// Number of fare workers
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Run Criterion benchmarks
    Bench,
    /// Compare benchmarks: stash changes, create baseline, restore, compare
    BenchCompare,
    /// Run CI checks (fmt, clippy, tests, sample run, benchmarks)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Run load tests (ignored tests in fare_core)
    LoadTest,
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Price the sample path file end to end
    Sample,
    /// Run benchmarks
    Bench,
    /// Run check + sample + bench
    All,
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

/// Runs `program` with `args`, exiting with its status code on failure.
fn run(program: &str, args: &[&str]) {
    eprintln!("+ {program} {}", args.join(" "));
    let status: ExitStatus = Command::new(program)
        .args(args)
        .status()
        .unwrap_or_else(|error| {
            eprintln!("failed to execute {program}: {error}");
            exit(1)
        });
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn run_cargo(args: &[&str]) {
    run("cargo", args);
}

fn price_file(input: &str, output: Option<&str>, workers: Option<usize>) {
    let workers = workers.map(|count| count.to_string());
    let mut args = vec!["run", "-p", "fare_cli", "--release", "--", input];
    if let Some(output) = output {
        args.push(output);
    }
    if let Some(workers) = workers.as_deref() {
        args.extend(["--workers", workers]);
    }
    run_cargo(&args);
}

fn bench(extra: &[&str]) {
    let mut args = vec!["bench", "--package", "fare_core", "--bench", "performance"];
    if !extra.is_empty() {
        args.push("--");
        args.extend_from_slice(extra);
    }
    run_cargo(&args);
}

/// Benchmarks the stashed-away baseline, then the working tree against it.
fn bench_compare() {
    let baseline_dir = Path::new("target/criterion");
    if baseline_dir.exists() {
        step("Removing previous Criterion data");
        if let Err(error) = std::fs::remove_dir_all(baseline_dir) {
            eprintln!("failed to remove {}: {error}", baseline_dir.display());
            exit(1);
        }
    }

    step("Stashing working tree");
    run("git", &["stash", "push", "-m", "xtask bench-compare baseline"]);
    bench(&["--save-baseline", "main"]);

    step("Restoring working tree");
    run("git", &["stash", "pop"]);
    bench(&["--baseline", "main"]);
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test fare_core");
    run_cargo(&["test", "-p", "fare_core"]);

    step("Test fare_cli");
    run_cargo(&["test", "-p", "fare_cli"]);
}

fn ci_sample() {
    step("Price sample paths");
    price_file(SAMPLE_PATHS, None, None);
}

fn ci_bench() {
    step("Run benchmarks");
    bench(&[]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            output,
            workers,
        } => {
            price_file(&input, output.as_deref(), workers);
        }
        Commands::Bench => bench(&[]),
        Commands::BenchCompare => bench_compare(),
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Sample => ci_sample(),
                CiJob::Bench => ci_bench(),
                CiJob::All => {
                    ci_check();
                    ci_sample();
                    ci_bench();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::LoadTest => {
            run_cargo(&[
                "test",
                "-p",
                "fare_core",
                "--test",
                "load_tests",
                "--",
                "--ignored",
            ]);
        }
    }
}
