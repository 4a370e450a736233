//! Vulnerability severity ranking

use serde::{Deserialize, Serialize};
use std::fmt;

/// Impact ranking of a vulnerability.
///
/// Ordering follows priority: `Critical < High < Medium < Low < Unknown`, so
/// sorting ascending puts the most severe records first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    /// Missing or unrecognised severity on the wire.
    Unknown,
}

impl Severity {
    /// The four severities the backend summarises in its counts.
    pub const RANKED: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Parse a wire value. Matching is case-sensitive.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CRITICAL" => Some(Self::Critical),
            "HIGH" => Some(Self::High),
            "MEDIUM" => Some(Self::Medium),
            "LOW" => Some(Self::Low),
            "UNKNOWN" => Some(Self::Unknown),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Unknown => "UNKNOWN",
        }
    }

    fn cli_alias(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl clap::ValueEnum for Severity {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            Self::Critical,
            Self::High,
            Self::Medium,
            Self::Low,
            Self::Unknown,
        ]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()).alias(self.cli_alias()))
    }
}

/// Per-severity summary counts as reported by the backend.
///
/// Absent severities deserialize to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    #[serde(rename = "CRITICAL", default)]
    pub critical: u64,
    #[serde(rename = "HIGH", default)]
    pub high: u64,
    #[serde(rename = "MEDIUM", default)]
    pub medium: u64,
    #[serde(rename = "LOW", default)]
    pub low: u64,
}

impl SeverityCounts {
    /// Count for one severity. `Unknown` is never summarised and reads as 0.
    #[must_use]
    pub fn get(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Unknown => 0,
        }
    }

    /// Set the count for one severity. Setting `Unknown` is a no-op.
    pub fn set(&mut self, severity: Severity, count: u64) {
        match severity {
            Severity::Critical => self.critical = count,
            Severity::High => self.high = count,
            Severity::Medium => self.medium = count,
            Severity::Low => self.low = count,
            Severity::Unknown => {}
        }
    }

    /// Sum over the ranked severities, saturating at `u64::MAX`.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.critical
            .saturating_add(self.high)
            .saturating_add(self.medium)
            .saturating_add(self.low)
    }

    /// Iterate `(severity, count)` pairs in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (Severity, u64)> + '_ {
        Severity::RANKED.into_iter().map(|s| (s, self.get(s)))
    }
}
