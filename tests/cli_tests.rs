//! CLI behavior tests driving the real binary with a fake harness script
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Write an executable fake harness that reports a fixed score for every
/// benchmark.
///
/// Invoked as: harness --bench NAME --timeout-secs N --output PATH [--exact]
fn write_harness(dir: &Path, score_ns: &str) -> std::path::PathBuf {
    let path = dir.join("fake-harness.sh");
    let script = format!(
        "#!/bin/sh\nbench=\"$2\"\nout=\"$6\"\nprintf '%s,{}\\n' \"$bench\" > \"$out\"\n",
        score_ns
    );
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn recaer() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("recaer").unwrap()
}

#[test]
fn test_help_lists_core_flags() {
    recaer()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--tolerance"))
        .stdout(predicate::str::contains("--max-iterations"))
        .stdout(predicate::str::contains("--summary-only"))
        .stdout(predicate::str::contains("--results-path"));
}

#[test]
fn test_first_run_bootstraps_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let harness = write_harness(dir.path(), "100000000.0");
    let results = dir.path().join("results");

    recaer()
        .arg("--harness")
        .arg(&harness)
        .arg("-r")
        .arg(&results)
        .arg("-b")
        .arg("matmul")
        .arg("--no-shuffle")
        .assert()
        .success()
        .stdout(predicate::str::contains("new baseline"));

    assert!(results.join("baseline/measurements/matmul.csv").exists());
}

#[test]
fn test_steady_performance_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let harness = write_harness(dir.path(), "100000000.0");
    let results = dir.path().join("results");

    for _ in 0..2 {
        recaer()
            .arg("--harness")
            .arg(&harness)
            .arg("-r")
            .arg(&results)
            .arg("-b")
            .arg("matmul")
            .arg("--no-shuffle")
            .assert()
            .success();
    }
}

#[test]
fn test_confirmed_regression_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let results = dir.path().join("results");

    // Baseline at 100ms/op
    let fast = write_harness(dir.path(), "100000000.0");
    recaer()
        .arg("--harness")
        .arg(&fast)
        .arg("-r")
        .arg(&results)
        .arg("-b")
        .arg("matmul")
        .arg("--no-shuffle")
        .assert()
        .success();

    // Every re-measurement also comes back at 200ms/op: confirmed
    let slow = write_harness(dir.path(), "200000000.0");
    recaer()
        .arg("--harness")
        .arg(&slow)
        .arg("-r")
        .arg(&results)
        .arg("-b")
        .arg("matmul")
        .arg("--no-shuffle")
        .arg("--max-iterations")
        .arg("2")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Confirmed regressions:  1"))
        .stdout(predicate::str::contains("matmul"));
}

#[test]
fn test_summary_only_with_no_results_fails() {
    let dir = tempfile::tempdir().unwrap();
    let harness = write_harness(dir.path(), "100000000.0");

    recaer()
        .arg("--harness")
        .arg(&harness)
        .arg("-r")
        .arg(dir.path().join("empty"))
        .arg("--summary-only")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no valid results"));
}
