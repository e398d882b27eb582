//! Regression detection: baseline vs current comparison under a tolerance
//!
//! Pure comparison, no side effects. The retry machinery that decides which
//! flagged measurements are real lives in `minimum`.

use crate::results::ResultSet;
use std::collections::BTreeSet;

/// Fractional tolerance used when no override is given (0.4 = 40% slower)
pub const DEFAULT_TOLERANCE: f64 = 0.4;

/// Find every measurement whose current duration exceeds its baseline by
/// more than the tolerance fraction.
///
/// Only identifiers present in both sets are compared; a removed or newly
/// added benchmark has no baseline to regress against. The inequality is
/// strict: a measurement exactly at the tolerance boundary is not flagged.
/// A zero baseline makes the delta infinite, so any nonzero current flags,
/// the conservative reading of "infinitely significant".
pub fn find_regressions(
    baseline: &ResultSet,
    current: &ResultSet,
    tolerance: f64,
) -> BTreeSet<String> {
    let mut flagged = BTreeSet::new();

    for (name, &value_baseline) in baseline.iter() {
        let Some(value_current) = current.get(name) else {
            continue;
        };

        if value_current / value_baseline - 1.0 <= tolerance {
            continue;
        }

        flagged.insert(name.clone());
    }

    flagged
}
