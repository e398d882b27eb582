//! Error taxonomy for the regression pipeline
//!
//! Two families matter here: recoverable data problems (a malformed artifact
//! is skipped by the loader) and fatal integration problems (the measurement
//! engine misbehaving aborts the whole run so a real regression can never be
//! silently masked as "inconclusive").

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the regression pipeline
#[derive(Debug, Error)]
pub enum RegressionError {
    /// A row in a measurement artifact could not be parsed.
    ///
    /// The loader treats this as "skip this artifact, keep the rest".
    #[error("malformed artifact {path}: line {line}: {reason}")]
    MalformedArtifact {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// An exact-match measurement produced a number of rows other than one.
    ///
    /// This is a broken assumption about the external engine, not a data
    /// problem, and is fatal to the current minimum-finding run.
    #[error("exact-match measurement of `{name}` yielded {count} results, expected exactly 1")]
    IntegrationFault { name: String, count: usize },

    /// The external measurement engine failed or timed out.
    #[error("measurement engine failed for `{name}`: {reason}")]
    Engine { name: String, reason: String },

    /// No usable results directory exists (summary-only mode with nothing to
    /// summarize).
    #[error("no valid results found under {path}")]
    NoResults { path: PathBuf },
}
