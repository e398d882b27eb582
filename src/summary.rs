//! Summary rendering for a completed regression run
//!
//! Pure formatting over the final result sets: counts, a one-line subject
//! for notification transports, and a deterministic plain-text report. The
//! same inputs always render byte-identical text.

use crate::results::ResultSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// One confirmed regression with the evidence behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionReport {
    pub name: String,
    pub baseline_ms: f64,
    pub current_ms: f64,
    /// `current/baseline - 1.0`, computed from the merged (best-found)
    /// current duration
    pub relative_delta: f64,
}

/// Summary of one regression run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Measurements flagged by detection but cleared as noise by the
    /// minimum finder
    pub flagged: Vec<String>,
    /// Confirmed regressions
    pub exceptions: Vec<RegressionReport>,
    pub compared: usize,
    pub processing_time_secs: u64,
}

/// Merge detection and minimum-finding outcomes into a renderable summary
pub fn build_summary(
    baseline: &ResultSet,
    current: &ResultSet,
    flagged: &BTreeSet<String>,
    confirmed: &BTreeSet<String>,
    elapsed: Duration,
) -> RunSummary {
    let cleared = flagged
        .iter()
        .filter(|name| !confirmed.contains(*name))
        .cloned()
        .collect();

    let exceptions = confirmed
        .iter()
        .filter_map(|name| {
            let baseline_ms = baseline.get(name)?;
            let current_ms = current.get(name)?;
            Some(RegressionReport {
                name: name.clone(),
                baseline_ms,
                current_ms,
                relative_delta: current_ms / baseline_ms - 1.0,
            })
        })
        .collect();

    let compared = baseline
        .iter()
        .filter(|(name, _)| current.contains(name))
        .count();

    RunSummary {
        flagged: cleared,
        exceptions,
        compared,
        processing_time_secs: elapsed.as_secs(),
    }
}

impl RunSummary {
    /// One-line subject for a notification transport
    pub fn subject(&self) -> String {
        format!(
            "Runtime Regression: Flagged {:3} Exceptions={:3}",
            self.flagged.len(),
            self.exceptions.len()
        )
    }

    /// Plain-text report body
    pub fn render(&self) -> String {
        let mut text = String::new();
        text.push_str("Runtime Regression Summary\n\n");
        text.push_str(&format!("Measurements compared:  {}\n", self.compared));
        text.push_str(&format!("Flagged, then cleared:  {}\n", self.flagged.len()));
        text.push_str(&format!("Confirmed regressions:  {}\n", self.exceptions.len()));

        if !self.exceptions.is_empty() {
            text.push_str("\nConfirmed:\n");
            for report in &self.exceptions {
                text.push_str(&format!(
                    "  {:+7.1}%  {:10.4} -> {:10.4} (ms/op)  {}\n",
                    report.relative_delta * 100.0,
                    report.baseline_ms,
                    report.current_ms,
                    report.name
                ));
            }
        }

        if !self.flagged.is_empty() {
            text.push_str("\nCleared as noise:\n");
            for name in &self.flagged {
                text.push_str(&format!("  {}\n", name));
            }
        }

        let secs = self.processing_time_secs;
        text.push_str(&format!(
            "\nTotal Elapsed Time is {:02}:{:02}:{:02}\n",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60
        ));
        text
    }
}
