use anyhow::Result;
use clap::Parser;
use recaer::cli::Cli;
use recaer::discovery::SourceTreeProvider;
use recaer::engine::HarnessEngine;
use recaer::notify::{NoopNotifier, Notifier, ScriptNotifier};
use recaer::runner::{RegressionRunner, RunOutcome, RunnerConfig};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = RunnerConfig {
        results_dir: cli.results_path.clone(),
        tolerance: cli.tolerance,
        max_iterations: cli.max_iterations,
        timeout: Duration::from_secs(cli.timeout_min * 60),
        benchmarks: cli.benchmarks.clone(),
        randomized_order: !cli.no_shuffle,
        summary_only: cli.summary_only,
        minimum_only: cli.minimum_only,
    };

    let engine = HarnessEngine::new(cli.harness.clone());
    let provider = SourceTreeProvider::new(cli.bench_root.clone());
    let notifier: Box<dyn Notifier> = match &cli.notify_command {
        Some(cmd) => Box::new(ScriptNotifier::new(cmd.clone())),
        None => Box::new(NoopNotifier),
    };

    let runner = RegressionRunner::new(config, &engine, &provider, &notifier);
    match runner.run()? {
        RunOutcome::BaselineInitialized { baseline_dir } => {
            println!(
                "Baseline doesn't exist. Current results are the new baseline: {}",
                baseline_dir.display()
            );
        }
        RunOutcome::Summary(summary) => {
            println!("{}", summary.render());
            if !summary.exceptions.is_empty() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
