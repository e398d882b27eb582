//! Benchmark discovery
//!
//! Which benchmarks exist is decided by scanning the source tree rather
//! than by a registry: a new benchmark file is picked up without anyone
//! remembering to list it, and a renamed directory fails loudly instead of
//! silently dropping its benchmarks.

use anyhow::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Lists the measurements available to a run
pub trait MeasurementProvider {
    fn available_measurements(&self) -> Result<Vec<String>>;
}

/// Fixed list provider, for user-specified subsets and tests
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    names: Vec<String>,
}

impl StaticProvider {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }
}

impl MeasurementProvider for StaticProvider {
    fn available_measurements(&self) -> Result<Vec<String>> {
        Ok(self.names.clone())
    }
}

/// Discovers benchmarks by scanning a source tree for `bench_*.rs` files
///
/// The benchmark name is the relative path with separators replaced by `.`
/// and the `.rs` suffix dropped, e.g. `dense/bench_matmul.rs` becomes
/// `dense.bench_matmul`.
#[derive(Debug, Clone)]
pub struct SourceTreeProvider {
    root: PathBuf,
    skip_dirs: Vec<String>,
    name_filter: Option<Regex>,
}

impl SourceTreeProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            skip_dirs: vec!["experimental".to_string()],
            name_filter: None,
        }
    }

    /// Directory names excluded from the scan
    pub fn with_skip_dirs(mut self, skip_dirs: Vec<String>) -> Self {
        self.skip_dirs = skip_dirs;
        self
    }

    /// Only report benchmark names matching the pattern
    pub fn with_name_filter(mut self, pattern: &str) -> Result<Self> {
        self.name_filter = Some(Regex::new(pattern)?);
        Ok(self)
    }

    fn visit(&self, dir: &Path, names: &mut Vec<String>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(()), // unreadable subtree, nothing to list
        };

        let mut paths: Vec<_> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();

        for path in &paths {
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !file_name.starts_with("bench_") || !file_name.ends_with(".rs") {
                continue;
            }

            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let name = relative
                .with_extension("")
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(".");

            if let Some(filter) = &self.name_filter {
                if !filter.is_match(&name) {
                    continue;
                }
            }
            names.push(name);
        }

        // Depth first through subdirectories
        for path in &paths {
            if !path.is_dir() {
                continue;
            }
            let dir_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if self.skip_dirs.iter().any(|s| s == dir_name) {
                continue;
            }
            self.visit(path, names)?;
        }

        Ok(())
    }
}

impl MeasurementProvider for SourceTreeProvider {
    fn available_measurements(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        self.visit(&self.root, &mut names)?;
        Ok(names)
    }
}
