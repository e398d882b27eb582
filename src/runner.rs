//! Run orchestration: measure, compare, re-check, summarize
//!
//! Ties the pipeline together for one run: measure every benchmark (or a
//! user subset) into a fresh results directory, compare against the stored
//! baseline, hand flagged measurements to the minimum finder, then render
//! and deliver the summary. The first ever run bootstraps the baseline
//! instead of comparing.

use crate::detector::{self, DEFAULT_TOLERANCE};
use crate::discovery::MeasurementProvider;
use crate::engine::MeasurementEngine;
use crate::error::RegressionError;
use crate::minimum::{MinimumFinder, DEFAULT_MAX_ITERATIONS};
use crate::notify::Notifier;
use crate::report::RunReporter;
use crate::results::ResultSet;
use crate::summary::{build_summary, RunSummary};
use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Subdirectory of a run holding its measurement artifacts
pub const MEASUREMENTS_DIR: &str = "measurements";

/// Subdirectory of the results root holding the last known good run
pub const BASELINE_DIR: &str = "baseline";

/// Default per-measurement timeout enforced by the harness.
///
/// Kept small: this tooling catches regressions, it does not evaluate
/// performance on large datasets.
pub const DEFAULT_TIMEOUT_MIN: u64 = 3;

/// Configuration threaded into one regression run
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Root directory holding the baseline and per-run result directories
    pub results_dir: PathBuf,
    /// Fractional tolerance for a significant slowdown
    pub tolerance: f64,
    /// Retry budget per flagged measurement
    pub max_iterations: usize,
    /// Per-measurement timeout handed to the harness
    pub timeout: Duration,
    /// Explicit subset of benchmarks to run; empty means discover all
    pub benchmarks: Vec<String>,
    /// Shuffle the run order to spread thermal load across runs
    pub randomized_order: bool,
    /// Skip measuring, summarize the most recent results
    pub summary_only: bool,
    /// Skip the full measurement pass but re-run the minimum search
    pub minimum_only: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("runtime_regression"),
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_MIN * 60),
            benchmarks: Vec::new(),
            randomized_order: true,
            summary_only: false,
            minimum_only: false,
        }
    }
}

/// What a run produced
#[derive(Debug)]
pub enum RunOutcome {
    /// No baseline existed; the current results became the baseline and no
    /// comparison happened
    BaselineInitialized { baseline_dir: PathBuf },
    /// A comparison ran to completion
    Summary(RunSummary),
}

/// One regression run over an engine, a discovery provider, and a notifier
pub struct RegressionRunner<'a, E, P, N>
where
    E: MeasurementEngine,
    P: MeasurementProvider,
    N: Notifier,
{
    config: RunnerConfig,
    engine: &'a E,
    provider: &'a P,
    notifier: &'a N,
}

impl<'a, E, P, N> RegressionRunner<'a, E, P, N>
where
    E: MeasurementEngine,
    P: MeasurementProvider,
    N: Notifier,
{
    pub fn new(config: RunnerConfig, engine: &'a E, provider: &'a P, notifier: &'a N) -> Self {
        Self {
            config,
            engine,
            provider,
            notifier,
        }
    }

    pub fn run(&self) -> Result<RunOutcome> {
        let start = Instant::now();
        fs::create_dir_all(&self.config.results_dir)
            .with_context(|| format!("creating {}", self.config.results_dir.display()))?;

        let reuse_results = self.config.summary_only || self.config.minimum_only;
        let current_dir = if reuse_results {
            self.select_most_recent_results()?
        } else {
            let dir = self.config.results_dir.join(unix_millis().to_string());
            fs::create_dir_all(dir.join(MEASUREMENTS_DIR))?;
            dir
        };
        tracing::info!(current = %current_dir.display(), "run directory");

        let mut reporter = RunReporter::open(&current_dir)?;

        if !reuse_results {
            self.measure_all(&current_dir, &mut reporter)?;
        }

        // Bootstrap: the very first run has nothing to compare against
        let baseline_dir = self.config.results_dir.join(BASELINE_DIR);
        if !baseline_dir.exists() {
            tracing::info!("baseline missing, current results become the baseline");
            drop(reporter);
            fs::rename(&current_dir, &baseline_dir).with_context(|| {
                format!(
                    "renaming {} to {}",
                    current_dir.display(),
                    baseline_dir.display()
                )
            })?;
            if let Err(e) = self
                .notifier
                .send("Runtime Regression: Initialized", "Created new baseline\n")
            {
                tracing::warn!(error = %e, "notification failed");
            }
            return Ok(RunOutcome::BaselineInitialized { baseline_dir });
        }

        let baseline = ResultSet::from_directory(&baseline_dir.join(MEASUREMENTS_DIR));
        let mut current = ResultSet::from_directory(&current_dir.join(MEASUREMENTS_DIR));

        let flagged = detector::find_regressions(&baseline, &current, self.config.tolerance);
        tracing::info!(flagged = flagged.len(), "initial detection complete");

        let rerun_minimum = !self.config.summary_only || self.config.minimum_only;
        let confirmed = if rerun_minimum && !flagged.is_empty() {
            let confirmed = self.eliminate_false_positives(
                &current_dir,
                &mut reporter,
                &baseline,
                &mut current,
                &flagged,
            )?;
            if let Err(e) = current.save(&current_dir.join("results.txt")) {
                reporter.error_line(&format!("failed to save merged results: {e}"));
            }
            confirmed
        } else {
            flagged.clone()
        };

        let summary = build_summary(&baseline, &current, &flagged, &confirmed, start.elapsed());
        reporter.write_summary("summary.txt", &summary.render());
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => reporter.write_summary("summary.json", &json),
            Err(e) => reporter.error_line(&format!("failed to encode summary: {e}")),
        }

        if let Err(e) = self.notifier.send(&summary.subject(), &summary.render()) {
            reporter.error_line(&format!("notification failed: {e}"));
        }

        Ok(RunOutcome::Summary(summary))
    }

    /// Measure every benchmark into the run's measurements directory.
    ///
    /// A failing benchmark is logged and skipped here: it simply has no
    /// artifact and drops out of the comparison. Only the minimum finder
    /// treats engine failure as fatal.
    fn measure_all(&self, current_dir: &Path, reporter: &mut RunReporter) -> Result<()> {
        let mut names = if self.config.benchmarks.is_empty() {
            self.provider.available_measurements()?
        } else {
            self.config.benchmarks.clone()
        };

        if self.config.randomized_order {
            names.shuffle(&mut rand::thread_rng());
        }

        let out = current_dir.join(MEASUREMENTS_DIR);
        for name in &names {
            let t0 = Instant::now();
            match self.engine.measure(name, false, self.config.timeout, &out) {
                Ok(_) => {
                    let minutes = t0.elapsed().as_secs_f64() / 60.0;
                    reporter.runtime_line(&format!("{:<70} {:7.2} (min)", name, minutes));
                }
                Err(e) => {
                    reporter.error_line(&format!("measurement failed for `{name}`: {e}"));
                }
            }
        }
        Ok(())
    }

    /// Hand the flagged set to the minimum finder and merge its refined
    /// durations back into the current results
    fn eliminate_false_positives(
        &self,
        current_dir: &Path,
        reporter: &mut RunReporter,
        baseline: &ResultSet,
        current: &mut ResultSet,
        flagged: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>> {
        let minimum_dir = current_dir.join("minimum");
        fs::create_dir_all(&minimum_dir)?;

        let mut finder = MinimumFinder::new(
            self.engine,
            self.config.tolerance,
            self.config.max_iterations,
            self.config.timeout,
            minimum_dir,
        );
        for name in flagged {
            // Flagged implies present in both sets
            let Some(target_ms) = baseline.get(name) else {
                continue;
            };
            finder.add_candidate(name.clone(), target_ms);
        }

        if let Err(e) = finder.process(reporter) {
            // Fail loud, but leave the evidence on disk first
            reporter.error_line(&format!("minimum finding aborted: {e}"));
            return Err(e.into());
        }

        current.merge_updates(finder.updated_results());
        Ok(finder.failed_names().clone())
    }

    /// Most recent results directory: highest name under the results root,
    /// excluding the baseline
    fn select_most_recent_results(&self) -> Result<PathBuf, RegressionError> {
        let entries =
            fs::read_dir(&self.config.results_dir).map_err(|_| RegressionError::NoResults {
                path: self.config.results_dir.clone(),
            })?;

        entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .filter(|p| p.file_name().is_some_and(|n| n != BASELINE_DIR))
            .max()
            .ok_or(RegressionError::NoResults {
                path: self.config.results_dir.clone(),
            })
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
