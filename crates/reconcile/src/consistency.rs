//! Cross-checking summary counts against the detailed vulnerability list
//!
//! The backend trims the detailed list, so disagreement is expected and never
//! treated as an error. The report only makes it visible.

use cscan_types::{ScanResult, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One way the summary and the detail disagree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    /// Summary count for a severity differs from the records carrying it
    SeverityMismatch {
        severity: Severity,
        summary: u64,
        detail: u64,
    },
    /// Reported total differs from the summed counts or the list length
    TotalMismatch {
        reported: u64,
        summed: u64,
        listed: u64,
    },
    /// Backend said it returned fewer records than it found
    Truncated { returned: u64, available: u64 },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeverityMismatch {
                severity,
                summary,
                detail,
            } => write!(
                f,
                "{severity}: summary reports {summary}, detailed list has {detail}"
            ),
            Self::TotalMismatch {
                reported,
                summed,
                listed,
            } => write!(
                f,
                "total: reported {reported}, severity counts sum to {summed}, detailed list has {listed}"
            ),
            Self::Truncated {
                returned,
                available,
            } => write!(
                f,
                "showing {returned} of {available} vulnerabilities found by the backend"
            ),
        }
    }
}

/// Outcome of [`check_consistency`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub discrepancies: Vec<Discrepancy>,
}

impl ConsistencyReport {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.discrepancies.is_empty()
    }

    /// Severity mismatches only, in priority order.
    pub fn severity_mismatches(&self) -> impl Iterator<Item = (Severity, u64, u64)> + '_ {
        self.discrepancies.iter().filter_map(|d| match d {
            Discrepancy::SeverityMismatch {
                severity,
                summary,
                detail,
            } => Some((*severity, *summary, *detail)),
            _ => None,
        })
    }

    /// Whether the backend reported trimming the detailed list.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.discrepancies
            .iter()
            .any(|d| matches!(d, Discrepancy::Truncated { .. }))
    }

    /// One human-readable line per discrepancy.
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        self.discrepancies.iter().map(ToString::to_string).collect()
    }
}

/// Recount the detailed list and compare it with the summary.
///
/// Every ranked severity whose summary count differs from the number of
/// records carrying it is listed. Total drift and backend-reported
/// truncation are reported separately.
#[must_use]
pub fn check_consistency(result: &ScanResult) -> ConsistencyReport {
    let mut discrepancies = Vec::new();

    for (severity, summary) in result.severity_counts.iter() {
        let detail = result.detail_count(severity);
        if summary != detail {
            discrepancies.push(Discrepancy::SeverityMismatch {
                severity,
                summary,
                detail,
            });
        }
    }

    let reported = result.total_vulnerability_count;
    let summed = result.severity_counts.total();
    let listed = result.vulnerabilities.len() as u64;
    if reported != summed || reported != listed {
        discrepancies.push(Discrepancy::TotalMismatch {
            reported,
            summed,
            listed,
        });
    }

    if let Some(breakdown) = &result.breakdown {
        if let (Some(returned), Some(available)) =
            (breakdown.total_returned, breakdown.total_available)
        {
            if available > returned {
                discrepancies.push(Discrepancy::Truncated {
                    returned,
                    available,
                });
            }
        }
    }

    ConsistencyReport { discrepancies }
}
