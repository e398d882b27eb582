//! ResultSet: keyed timing measurements aggregated from artifacts
//!
//! A ResultSet maps measurement identifiers to milliseconds-per-operation
//! durations. One is built per benchmark run (current) or loaded from the
//! stored baseline. BTreeMap keeps iteration deterministic so reports come
//! out byte-identical across runs on the same data.

use crate::artifact;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Mapping from measurement identifier to duration in milliseconds per op
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    entries: BTreeMap<String, f64>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.csv` artifact in a directory into one ResultSet.
    ///
    /// A missing or unreadable directory yields an empty set; "no baseline
    /// yet" is a valid state, not an error. A malformed artifact is skipped
    /// with a warning; the rest of the directory still loads. Duplicate
    /// identifiers across artifacts resolve last-write-wins (files visited
    /// in sorted name order) and each overwrite is logged.
    pub fn from_directory(dir: &Path) -> Self {
        let mut set = Self::new();

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => {
                tracing::debug!(dir = %dir.display(), "results directory missing, empty set");
                return set;
            }
        };

        let mut files: Vec<_> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "csv"))
            .collect();
        files.sort();

        for file in files {
            match artifact::parse_artifact(&file) {
                Ok(rows) => {
                    for row in rows {
                        set.insert(row.key(), row.milliseconds_per_op());
                    }
                }
                Err(e) => {
                    tracing::warn!(artifact = %file.display(), error = %e, "skipping artifact");
                }
            }
        }

        set
    }

    /// Insert a measurement, warning when an existing identifier is
    /// overwritten
    pub fn insert(&mut self, key: String, ms_per_op: f64) {
        if let Some(previous) = self.entries.insert(key.clone(), ms_per_op) {
            tracing::warn!(
                key = %key,
                previous,
                current = ms_per_op,
                "duplicate measurement identifier, last write wins"
            );
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.entries.iter()
    }

    /// Overwrite entries with refined durations from the minimum finder
    pub fn merge_updates(&mut self, updates: &BTreeMap<String, f64>) {
        for (key, ms) in updates {
            self.entries.insert(key.clone(), *ms);
        }
    }

    /// Persist as a `key,value` summary file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let mut file = fs::File::create(path)?;
        writeln!(file, "# Results Summary")?;
        for (key, ms) in &self.entries {
            writeln!(file, "{},{}", key, ms)?;
        }
        file.flush()
    }
}
