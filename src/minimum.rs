//! Minimum finding: false-positive elimination for flagged regressions
//!
//! A single bad measurement (system jitter, thermal throttling) must not
//! confirm a regression. Each flagged benchmark is re-measured for up to
//! `max_iterations` rounds while its best score ever observed is tracked.
//! One good round is enough to clear a candidate; a candidate that never
//! comes back within tolerance is a confirmed regression, reported with its
//! most charitable measurement so the regression is never overstated.
//!
//! Measurements run strictly serialized: a sibling measurement on another
//! core would corrupt the very numbers being compared.

use crate::artifact;
use crate::engine::MeasurementEngine;
use crate::error::RegressionError;
use crate::report::AuditSink;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;

/// Default retry budget before a flagged measurement is confirmed
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// One flagged measurement being re-examined
#[derive(Debug, Clone)]
struct Candidate {
    name: String,
    target_ms: f64,
    /// Best (smallest) duration observed across rounds. Seeded unbounded:
    /// the first real measurement establishes it, so a candidate can never
    /// be cleared without at least one re-measurement.
    best_found_ms: f64,
}

/// Re-measures flagged benchmarks, keeping the minimum duration ever seen
pub struct MinimumFinder<'a, E: MeasurementEngine> {
    engine: &'a E,
    tolerance: f64,
    max_iterations: usize,
    timeout: Duration,
    output_dir: PathBuf,
    candidates: Vec<Candidate>,
    updated: BTreeMap<String, f64>,
    failed: BTreeSet<String>,
}

impl<'a, E: MeasurementEngine> MinimumFinder<'a, E> {
    pub fn new(
        engine: &'a E,
        tolerance: f64,
        max_iterations: usize,
        timeout: Duration,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            tolerance,
            max_iterations,
            timeout,
            output_dir: output_dir.into(),
            candidates: Vec::new(),
            updated: BTreeMap::new(),
            failed: BTreeSet::new(),
        }
    }

    /// Queue a flagged measurement with its baseline target duration
    pub fn add_candidate(&mut self, name: impl Into<String>, target_ms: f64) {
        self.candidates.push(Candidate {
            name: name.into(),
            target_ms,
            best_found_ms: f64::INFINITY,
        });
    }

    /// Refined durations for every candidate that was measured, cleared or
    /// not: always the best score observed, never the originally flagged
    /// one
    pub fn updated_results(&self) -> &BTreeMap<String, f64> {
        &self.updated
    }

    /// Identifiers confirmed as regressions after the retry budget
    pub fn failed_names(&self) -> &BTreeSet<String> {
        &self.failed
    }

    /// Run the bounded retry loop.
    ///
    /// Engine failures and integration faults abort the whole invocation.
    /// Skipping a broken measurement would let a real regression disappear
    /// into "inconclusive", so there is no partial credit here.
    pub fn process(&mut self, audit: &mut dyn AuditSink) -> Result<(), RegressionError> {
        for round in 0..self.max_iterations {
            // Reverse order so removal never skips a remaining candidate
            for i in (0..self.candidates.len()).rev() {
                let name = self.candidates[i].name.clone();
                let score = self.measure_exact(&name)?;

                let candidate = &mut self.candidates[i];
                candidate.best_found_ms = candidate.best_found_ms.min(score);

                // Accept on the latest round's score alone; best_found is
                // kept for reporting candidates that never clear
                let delta = score / candidate.target_ms - 1.0;
                if delta < self.tolerance {
                    tracing::info!(round, delta, name = %candidate.name, "accepted");
                    audit.record(&format!(
                        "Accepted: Trial={:2} score={:7.3} name={}",
                        round, delta, candidate.name
                    ));
                    self.updated
                        .insert(candidate.name.clone(), candidate.best_found_ms);
                    self.candidates.remove(i);
                } else {
                    tracing::info!(round, delta, name = %candidate.name, "rejected");
                    audit.record(&format!(
                        "Rejected: Trial={:2} score={:7.3} name={}",
                        round, delta, candidate.name
                    ));
                }
            }

            if self.candidates.is_empty() {
                break;
            }
        }

        for candidate in self.candidates.drain(..) {
            self.failed.insert(candidate.name.clone());
            if candidate.best_found_ms.is_finite() {
                self.updated.insert(candidate.name, candidate.best_found_ms);
            }
        }

        Ok(())
    }

    /// One exact-match measurement: exactly one row or it is an integration
    /// fault
    fn measure_exact(&self, name: &str) -> Result<f64, RegressionError> {
        let artifact_path = self
            .engine
            .measure(name, true, self.timeout, &self.output_dir)?;
        let rows = artifact::parse_artifact(&artifact_path)?;
        if rows.len() != 1 {
            return Err(RegressionError::IntegrationFault {
                name: name.to_string(),
                count: rows.len(),
            });
        }
        Ok(rows[0].milliseconds_per_op())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::VecSink;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::collections::VecDeque;
    use std::fs;
    use std::path::{Path, PathBuf};

    /// Engine that replays scripted scores, writing a one-row artifact per
    /// call the way the real harness would
    struct ScriptedEngine {
        scripts: RefCell<HashMap<String, VecDeque<f64>>>,
        fail_on: Option<String>,
        rows_per_artifact: usize,
    }

    impl ScriptedEngine {
        fn new(scripts: &[(&str, &[f64])]) -> Self {
            let map = scripts
                .iter()
                .map(|(name, scores)| (name.to_string(), scores.iter().copied().collect()))
                .collect();
            Self {
                scripts: RefCell::new(map),
                fail_on: None,
                rows_per_artifact: 1,
            }
        }
    }

    impl MeasurementEngine for ScriptedEngine {
        fn measure(
            &self,
            name: &str,
            exact: bool,
            _timeout: Duration,
            output_dir: &Path,
        ) -> Result<PathBuf, RegressionError> {
            assert!(exact, "minimum finder must request exact-match mode");
            if self.fail_on.as_deref() == Some(name) {
                return Err(RegressionError::Engine {
                    name: name.to_string(),
                    reason: "scripted failure".to_string(),
                });
            }

            let ms = self
                .scripts
                .borrow_mut()
                .get_mut(name)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| panic!("no scripted score left for {name}"));

            let path = output_dir.join(format!("{name}.csv"));
            let row = format!("{},{}\n", name, ms * 1_000_000.0);
            fs::write(&path, row.repeat(self.rows_per_artifact)).unwrap();
            Ok(path)
        }
    }

    fn run_finder(
        engine: &ScriptedEngine,
        candidates: &[(&str, f64)],
        tolerance: f64,
        max_iterations: usize,
    ) -> Result<(BTreeMap<String, f64>, BTreeSet<String>, VecSink), RegressionError> {
        let dir = tempfile::tempdir().unwrap();
        let mut finder = MinimumFinder::new(
            engine,
            tolerance,
            max_iterations,
            Duration::from_secs(60),
            dir.path(),
        );
        for (name, target) in candidates {
            finder.add_candidate(*name, *target);
        }
        let mut sink = VecSink::default();
        finder.process(&mut sink)?;
        Ok((finder.updated.clone(), finder.failed.clone(), sink))
    }

    #[test]
    fn test_accepted_after_one_good_round() {
        // Rounds produce 150, 120, 95; round 3 clears 0.4 tolerance
        let engine = ScriptedEngine::new(&[("foo", &[150.0, 120.0, 95.0])]);
        let (updated, failed, _) = run_finder(&engine, &[("foo", 100.0)], 0.4, 10).unwrap();

        assert!(failed.is_empty());
        assert_eq!(updated.get("foo"), Some(&95.0));
    }

    #[test]
    fn test_confirmed_regression_reports_best_found() {
        // Never within tolerance across three rounds; best evidence is 148
        let engine = ScriptedEngine::new(&[("bar", &[150.0, 148.0, 151.0])]);
        let (updated, failed, _) = run_finder(&engine, &[("bar", 100.0)], 0.4, 3).unwrap();

        assert!(failed.contains("bar"));
        assert_eq!(updated.get("bar"), Some(&148.0));
    }

    #[test]
    fn test_best_found_is_monotonic_minimum() {
        // Accepted in round 2 with score 110, but round 1's 105 was better
        let engine = ScriptedEngine::new(&[("foo", &[105.0, 110.0])]);
        let (updated, _, _) = run_finder(&engine, &[("foo", 100.0)], 0.15, 10).unwrap();
        assert_eq!(updated.get("foo"), Some(&105.0));
    }

    #[test]
    fn test_first_round_acceptance() {
        let engine = ScriptedEngine::new(&[("foo", &[101.0])]);
        let (updated, failed, sink) = run_finder(&engine, &[("foo", 100.0)], 0.4, 10).unwrap();

        assert!(failed.is_empty());
        assert_eq!(updated.get("foo"), Some(&101.0));
        assert_eq!(sink.lines.len(), 1);
        assert!(sink.lines[0].starts_with("Accepted: Trial= 0"));
    }

    #[test]
    fn test_stops_early_when_working_set_empties() {
        // Only one scripted score per name: a second round would panic
        let engine = ScriptedEngine::new(&[("a", &[90.0]), ("b", &[95.0])]);
        let (updated, failed, _) =
            run_finder(&engine, &[("a", 100.0), ("b", 100.0)], 0.4, 10).unwrap();

        assert!(failed.is_empty());
        assert_eq!(updated.len(), 2);
    }

    #[test]
    fn test_every_decision_is_audited() {
        let engine = ScriptedEngine::new(&[("bar", &[150.0, 148.0, 151.0])]);
        let (_, _, sink) = run_finder(&engine, &[("bar", 100.0)], 0.4, 3).unwrap();

        assert_eq!(sink.lines.len(), 3);
        assert!(sink.lines.iter().all(|l| l.starts_with("Rejected:")));
        assert!(sink.lines.iter().all(|l| l.contains("name=bar")));
    }

    #[test]
    fn test_engine_failure_is_fatal() {
        let mut engine = ScriptedEngine::new(&[("ok", &[90.0])]);
        engine.fail_on = Some("broken".to_string());

        let result = run_finder(&engine, &[("broken", 100.0), ("ok", 100.0)], 0.4, 10);
        assert!(matches!(result, Err(RegressionError::Engine { .. })));
    }

    #[test]
    fn test_multi_row_artifact_is_integration_fault() {
        let mut engine = ScriptedEngine::new(&[("foo", &[90.0])]);
        engine.rows_per_artifact = 2;

        let result = run_finder(&engine, &[("foo", 100.0)], 0.4, 10);
        match result {
            Err(RegressionError::IntegrationFault { name, count }) => {
                assert_eq!(name, "foo");
                assert_eq!(count, 2);
            }
            other => panic!("expected integration fault, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_iterations_confirms_without_update() {
        // No rounds means no measurement: best_found stays unbounded and
        // nothing merges back
        let engine = ScriptedEngine::new(&[]);
        let (updated, failed, _) = run_finder(&engine, &[("foo", 100.0)], 0.4, 0).unwrap();

        assert!(failed.contains("foo"));
        assert!(updated.is_empty());
    }

    #[test]
    fn test_boundary_score_at_tolerance_rejected() {
        // delta exactly equal to tolerance is not `< tolerance`; 150/100
        // and 0.5 are exact in binary so the boundary really is hit
        let engine = ScriptedEngine::new(&[("foo", &[150.0, 150.0])]);
        let (_, failed, _) = run_finder(&engine, &[("foo", 100.0)], 0.5, 2).unwrap();
        assert!(failed.contains("foo"));
    }
}
