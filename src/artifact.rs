//! Measurement artifact parsing
//!
//! The external measurement engine writes one CSV artifact per benchmark
//! invocation. Row shape: `benchmark[,param...],score_ns`: name first,
//! nanoseconds-per-op score last, zero or more ordered parameter values in
//! between. One artifact may hold several rows (multiple parameterizations
//! of the same benchmark).

use crate::error::RegressionError;
use std::fs;
use std::path::Path;

/// Separator joining a benchmark name with its parameter values to form a
/// measurement identifier
pub const KEY_SEPARATOR: char = ':';

/// A single parsed measurement row
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRow {
    pub benchmark: String,
    pub parameters: Vec<String>,
    pub score_ns: f64,
}

impl MeasurementRow {
    /// Score converted to milliseconds per operation
    pub fn milliseconds_per_op(&self) -> f64 {
        self.score_ns / 1_000_000.0
    }

    /// Measurement identifier: benchmark name joined with each parameter
    /// value by `:`. Opaque key, never decomposed again.
    pub fn key(&self) -> String {
        let mut key = self.benchmark.clone();
        for p in &self.parameters {
            key.push(KEY_SEPARATOR);
            key.push_str(p);
        }
        key
    }
}

/// Parse one artifact file into its measurement rows.
///
/// A header row whose first field is `benchmark` is skipped. Any malformed
/// row aborts parsing of this artifact; the caller decides whether that is
/// fatal (the directory loader skips the artifact and keeps going).
pub fn parse_artifact(path: &Path) -> Result<Vec<MeasurementRow>, RegressionError> {
    let text = fs::read_to_string(path).map_err(|e| RegressionError::MalformedArtifact {
        path: path.to_path_buf(),
        line: 0,
        reason: e.to_string(),
    })?;
    parse_rows(&text, path)
}

fn parse_rows(text: &str, path: &Path) -> Result<Vec<MeasurementRow>, RegressionError> {
    let mut rows = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_fields(line);
        if idx == 0 && fields.first().map(String::as_str) == Some("benchmark") {
            continue; // header row
        }

        let malformed = |reason: &str| RegressionError::MalformedArtifact {
            path: path.to_path_buf(),
            line: line_no,
            reason: reason.to_string(),
        };

        if fields.len() < 2 {
            return Err(malformed("expected at least a name and a score"));
        }

        let benchmark = fields[0].clone();
        if benchmark.is_empty() {
            return Err(malformed("empty benchmark name"));
        }

        let score_field = &fields[fields.len() - 1];
        let score_ns: f64 = score_field
            .parse()
            .map_err(|_| malformed(&format!("invalid score `{}`", score_field)))?;
        if score_ns < 0.0 || !score_ns.is_finite() {
            return Err(malformed(&format!("negative or non-finite score `{}`", score_field)));
        }

        rows.push(MeasurementRow {
            benchmark,
            parameters: fields[1..fields.len() - 1].to_vec(),
            score_ns,
        });
    }

    Ok(rows)
}

/// Split one CSV line into fields, honoring quoted fields with embedded
/// commas and doubled quotes
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(text: &str) -> Result<Vec<MeasurementRow>, RegressionError> {
        parse_rows(text, &PathBuf::from("test.csv"))
    }

    #[test]
    fn test_parse_simple_row() {
        let rows = parse("matmul.dense,242377049.8\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].benchmark, "matmul.dense");
        assert!(rows[0].parameters.is_empty());
        assert!((rows[0].milliseconds_per_op() - 242.3770498).abs() < 1e-6);
    }

    #[test]
    fn test_parse_row_with_parameters() {
        let rows = parse("solve.lu,1000,upper,5000000.0\n").unwrap();
        assert_eq!(rows[0].parameters, vec!["1000", "upper"]);
        assert_eq!(rows[0].key(), "solve.lu:1000:upper");
    }

    #[test]
    fn test_parse_skips_header() {
        let rows = parse("benchmark,score_ns\nfoo,100.0\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].benchmark, "foo");
    }

    #[test]
    fn test_parse_multiple_rows() {
        let rows = parse("foo,1,100.0\nfoo,2,200.0\nbar,300.0\n").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].key(), "foo:1");
        assert_eq!(rows[1].key(), "foo:2");
        assert_eq!(rows[2].key(), "bar");
    }

    #[test]
    fn test_parse_quoted_field_with_comma() {
        let rows = parse("\"mult,transposed\",100.0\n").unwrap();
        assert_eq!(rows[0].benchmark, "mult,transposed");
    }

    #[test]
    fn test_parse_rejects_bad_score() {
        let err = parse("foo,not_a_number\n").unwrap_err();
        match err {
            RegressionError::MalformedArtifact { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_negative_score() {
        assert!(parse("foo,-5.0\n").is_err());
    }

    #[test]
    fn test_parse_rejects_short_row() {
        assert!(parse("foo\n").is_err());
    }

    #[test]
    fn test_parse_ignores_blank_lines() {
        let rows = parse("foo,100.0\n\nbar,200.0\n").unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_zero_score_is_legal() {
        let rows = parse("foo,0.0\n").unwrap();
        assert_eq!(rows[0].score_ns, 0.0);
    }

    #[test]
    fn test_split_fields_doubled_quotes() {
        let fields = split_fields("\"say \"\"hi\"\"\",1.0");
        assert_eq!(fields[0], "say \"hi\"");
        assert_eq!(fields[1], "1.0");
    }
}
