//! CLI argument parsing for Recaer

use crate::detector::DEFAULT_TOLERANCE;
use crate::minimum::DEFAULT_MAX_ITERATIONS;
use crate::runner::DEFAULT_TIMEOUT_MIN;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "recaer")]
#[command(version)]
#[command(
    about = "Runtime performance regression detector with false-positive elimination",
    long_about = None
)]
pub struct Cli {
    /// Fractional tolerance before a slowdown counts as significant
    /// (0.4 = 40% slower than baseline)
    #[arg(short = 't', long, default_value_t = DEFAULT_TOLERANCE)]
    pub tolerance: f64,

    /// Maximum re-measurement rounds before a flagged benchmark is
    /// confirmed as a regression
    #[arg(long = "max-iterations", default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,

    /// Per-measurement timeout in minutes, enforced by the harness
    #[arg(long = "timeout-min", value_name = "MIN", default_value_t = DEFAULT_TIMEOUT_MIN)]
    pub timeout_min: u64,

    /// Results directory holding the baseline and per-run results
    #[arg(
        short = 'r',
        long = "results-path",
        value_name = "DIR",
        default_value = "runtime_regression"
    )]
    pub results_path: PathBuf,

    /// Source tree scanned for benchmarks (bench_*.rs files)
    #[arg(long = "bench-root", value_name = "DIR", default_value = "benches")]
    pub bench_root: PathBuf,

    /// Run only this benchmark; repeat the flag for a subset. Default is
    /// to run everything discovered
    #[arg(short = 'b', long = "benchmark", value_name = "NAME")]
    pub benchmarks: Vec<String>,

    /// Benchmark harness command the engine invokes
    #[arg(long, value_name = "CMD", default_value = "recaer-harness")]
    pub harness: String,

    /// Command handed the summary (subject as argument, body on stdin)
    #[arg(long = "notify-command", value_name = "CMD")]
    pub notify_command: Option<String>,

    /// Only print the summary from the most recent results
    #[arg(long = "summary-only")]
    pub summary_only: bool,

    /// Skip the full measurement pass but re-run minimum finding
    #[arg(long = "minimum-only")]
    pub minimum_only: bool,

    /// Run benchmarks in discovery order instead of shuffling
    #[arg(long = "no-shuffle")]
    pub no_shuffle: bool,

    /// Enable verbose tracing output on stderr
    #[arg(long)]
    pub debug: bool,
}
