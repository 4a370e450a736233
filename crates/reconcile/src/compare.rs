//! Comparing two completed scans

use cscan_types::{ScanResult, Severity};
use serde::{Deserialize, Serialize};

/// How a candidate image fares against a baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanComparison {
    pub baseline_image: String,
    pub candidate_image: String,
    /// `(severity, baseline - candidate)` in priority order
    pub severity_deltas: Vec<(Severity, i64)>,
    /// Positive when the candidate has fewer vulnerabilities
    pub total_reduction: i64,
    /// Reduction as a percentage of the baseline, one decimal place
    pub improvement_percent: f64,
    pub candidate_is_better: bool,
    pub recommendation: String,
}

/// Compare `candidate` against `baseline` by their reported totals.
#[must_use]
pub fn compare(baseline: &ScanResult, candidate: &ScanResult) -> ScanComparison {
    let severity_deltas = Severity::RANKED
        .into_iter()
        .map(|s| {
            (
                s,
                signed(baseline.severity_counts.get(s)) - signed(candidate.severity_counts.get(s)),
            )
        })
        .collect();

    let baseline_total = signed(baseline.total_vulnerability_count);
    let total_reduction = baseline_total - signed(candidate.total_vulnerability_count);
    #[allow(clippy::cast_precision_loss)]
    let improvement_percent = if baseline_total == 0 {
        0.0
    } else {
        (total_reduction as f64 / baseline_total as f64 * 1000.0).round() / 10.0
    };

    let recommendation = match total_reduction.signum() {
        1 => "candidate is more secure",
        -1 => "baseline is more secure",
        _ => "both images have the same number of vulnerabilities",
    }
    .to_string();

    ScanComparison {
        baseline_image: baseline.image_reference.clone(),
        candidate_image: candidate.image_reference.clone(),
        severity_deltas,
        total_reduction,
        improvement_percent,
        candidate_is_better: total_reduction > 0,
        recommendation,
    }
}

fn signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
