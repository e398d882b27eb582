//! Run reporting: per-run log files and the audit sink seam
//!
//! Logs are an explicitly owned, scoped resource rather than redirected
//! process streams: the reporter is opened for one run directory, every
//! write is followed by a flush so partial logs survive a fatal abort, and
//! drop flushes whatever is left on every exit path.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Receives one line per audit-worthy event (minimum-finder round
/// decisions, per-benchmark runtimes)
pub trait AuditSink {
    fn record(&mut self, line: &str);
}

/// Collects lines in memory; the test-side sink
#[derive(Debug, Default)]
pub struct VecSink {
    pub lines: Vec<String>,
}

impl AuditSink for VecSink {
    fn record(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Writes run logs into the run's results directory
///
/// `runtime.txt` holds per-benchmark timings and round decisions,
/// `errors.txt` holds failures worth a postmortem.
pub struct RunReporter {
    dir: PathBuf,
    runtime: BufWriter<fs::File>,
    errors: BufWriter<fs::File>,
}

impl RunReporter {
    /// Open (or reopen) the log files for a run directory.
    ///
    /// Logs are opened in append mode: reopening an already measured run,
    /// as the summary-only and minimum-only modes do, must keep the
    /// per-benchmark timings and round decisions already on disk.
    pub fn open(dir: &Path) -> std::io::Result<Self> {
        fs::create_dir_all(dir)?;
        let runtime = open_log(&dir.join("runtime.txt"))?;
        let errors = open_log(&dir.join("errors.txt"))?;
        let fresh = runtime.get_ref().metadata()?.len() == 0;
        let mut reporter = Self {
            dir: dir.to_path_buf(),
            runtime,
            errors,
        };
        if fresh {
            reporter.runtime_line("# How long each benchmark took");
        }
        Ok(reporter)
    }

    pub fn runtime_line(&mut self, line: &str) {
        let _ = writeln!(self.runtime, "{}", line);
        let _ = self.runtime.flush();
    }

    pub fn error_line(&mut self, line: &str) {
        tracing::error!("{}", line);
        let _ = writeln!(self.errors, "{}", line);
        let _ = self.errors.flush();
    }

    /// Write the rendered summary. I/O failure here is logged, never fatal:
    /// the in-memory summary has already been produced.
    pub fn write_summary(&mut self, file_name: &str, text: &str) {
        let path = self.dir.join(file_name);
        if let Err(e) = fs::write(&path, text) {
            self.error_line(&format!("failed to write {}: {}", path.display(), e));
        }
    }
}

impl AuditSink for RunReporter {
    fn record(&mut self, line: &str) {
        self.runtime_line(line);
    }
}

fn open_log(path: &Path) -> std::io::Result<BufWriter<fs::File>> {
    let file = fs::OpenOptions::new().append(true).create(true).open(path)?;
    Ok(BufWriter::new(file))
}

impl Drop for RunReporter {
    fn drop(&mut self) {
        let _ = self.runtime.flush();
        let _ = self.errors.flush();
    }
}
