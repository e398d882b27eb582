//! External measurement engine boundary
//!
//! The engine that actually runs a benchmark and times it is an external
//! collaborator. This module defines the seam the core calls through plus
//! the production implementation that shells out to the benchmark harness.
//! The harness enforces the per-measurement timeout; the core only
//! propagates its failures.

use crate::error::RegressionError;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Invokes one benchmark measurement and reports where the artifact landed
pub trait MeasurementEngine {
    /// Run the named benchmark, write its artifact under `output_dir`, and
    /// return the artifact location.
    ///
    /// With `exact` set the engine must match the name exactly (no pattern
    /// expansion) so the artifact holds exactly one row.
    fn measure(
        &self,
        name: &str,
        exact: bool,
        timeout: Duration,
        output_dir: &Path,
    ) -> Result<PathBuf, RegressionError>;
}

/// Production engine: spawns the external benchmark harness command
#[derive(Debug, Clone)]
pub struct HarnessEngine {
    harness: String,
}

impl HarnessEngine {
    pub fn new(harness: impl Into<String>) -> Self {
        Self {
            harness: harness.into(),
        }
    }

    fn engine_error(&self, name: &str, reason: impl ToString) -> RegressionError {
        RegressionError::Engine {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl MeasurementEngine for HarnessEngine {
    fn measure(
        &self,
        name: &str,
        exact: bool,
        timeout: Duration,
        output_dir: &Path,
    ) -> Result<PathBuf, RegressionError> {
        let artifact = output_dir.join(format!("{}.csv", name));

        let mut cmd = Command::new(&self.harness);
        cmd.arg("--bench")
            .arg(name)
            .arg("--timeout-secs")
            .arg(timeout.as_secs().to_string())
            .arg("--output")
            .arg(&artifact);
        if exact {
            cmd.arg("--exact");
        }

        tracing::debug!(harness = %self.harness, benchmark = name, exact, "invoking harness");

        let status = cmd
            .status()
            .map_err(|e| self.engine_error(name, format!("failed to spawn harness: {e}")))?;

        if !status.success() {
            return Err(self.engine_error(name, format!("harness exited with {status}")));
        }

        Ok(artifact)
    }
}
