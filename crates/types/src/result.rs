//! Canonical scan result shapes
//!
//! These are produced only by normalization of a raw result payload and are
//! immutable afterwards.

use crate::{ScanId, Severity, SeverityCounts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version that fixes a vulnerability, or the explicit "not available" sentinel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "version", rename_all = "snake_case")]
pub enum FixedVersion {
    Available(String),
    NotAvailable,
}

impl FixedVersion {
    /// Absent and blank values both become `NotAvailable`.
    #[must_use]
    pub fn from_wire(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Self::Available(v.to_string()),
            _ => Self::NotAvailable,
        }
    }

    #[must_use]
    pub fn as_option(&self) -> Option<&str> {
        match self {
            Self::Available(v) => Some(v),
            Self::NotAvailable => None,
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

impl fmt::Display for FixedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(v) => f.write_str(v),
            Self::NotAvailable => f.write_str("Not Available"),
        }
    }
}

/// One vulnerability found in an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    pub id: String,
    pub severity: Severity,
    pub title: String,
    pub affected_package: String,
    pub installed_version: String,
    pub fixed_version: FixedVersion,
}

/// The backend's own account of how it trimmed the vulnerability list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBreakdown {
    pub critical_expected: Option<u64>,
    pub critical_returned: Option<u64>,
    pub high_returned: Option<u64>,
    pub total_returned: Option<u64>,
    pub total_available: Option<u64>,
}

/// Final, normalized result of a completed scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub scan_id: Option<ScanId>,
    pub image_reference: String,
    pub scan_timestamp: Option<DateTime<Utc>>,
    pub severity_counts: SeverityCounts,
    pub total_vulnerability_count: u64,
    pub vulnerabilities: Vec<VulnerabilityRecord>,
    pub scan_duration_secs: Option<f64>,
    pub breakdown: Option<ResultBreakdown>,
}

impl ScanResult {
    /// Number of detailed records carrying `severity`.
    #[must_use]
    pub fn detail_count(&self, severity: Severity) -> u64 {
        self.vulnerabilities
            .iter()
            .filter(|v| v.severity == severity)
            .count() as u64
    }
}
