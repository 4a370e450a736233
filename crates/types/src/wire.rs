//! Raw JSON payloads exchanged with the scan backend
//!
//! Every field the backend may omit is optional here. Turning these into the
//! canonical types is the reconciler's job; nothing else should read them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of the scan submission request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequestBody {
    pub image_name: String,
}

/// Body of an accepted submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitResponseBody {
    #[serde(default, alias = "scanId")]
    pub scan_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body returned with a non-success status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One vulnerability entry as the backend sends it.
///
/// The backend has been seen to spell the severity key both `severity` and
/// `Severity`, so both are captured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawVulnerability {
    #[serde(default, alias = "VulnerabilityID")]
    pub id: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default, rename = "Severity")]
    pub severity_capitalized: Option<String>,
    #[serde(default, alias = "Title")]
    pub title: Option<String>,
    #[serde(
        default,
        alias = "affectedPackage",
        alias = "affected_package",
        alias = "PkgName"
    )]
    pub package: Option<String>,
    #[serde(default, alias = "installedVersion", alias = "InstalledVersion")]
    pub installed_version: Option<String>,
    #[serde(default, alias = "fixedVersion", alias = "FixedVersion")]
    pub fixed_version: Option<String>,
}

/// Truncation report attached to a result payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBreakdown {
    #[serde(default)]
    pub critical_returned: Option<u64>,
    #[serde(default)]
    pub critical_expected: Option<u64>,
    #[serde(default)]
    pub high_returned: Option<u64>,
    #[serde(default)]
    pub total_returned: Option<u64>,
    #[serde(default)]
    pub total_available: Option<u64>,
}

/// Result payload as fetched from the result or stored-report endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawScanResult {
    #[serde(default, alias = "scanId")]
    pub scan_id: Option<String>,
    #[serde(
        default,
        alias = "imageReference",
        alias = "image_reference",
        alias = "scan_name"
    )]
    pub image_name: Option<String>,
    #[serde(default, alias = "scanTimestamp", alias = "scan_timestamp")]
    pub scan_date: Option<String>,
    #[serde(default, alias = "severityCounts")]
    pub severity_counts: Option<BTreeMap<String, u64>>,
    #[serde(default, alias = "totalVulnerabilityCount")]
    pub total_vulnerabilities: Option<u64>,
    #[serde(default)]
    pub vulnerabilities: Option<Vec<RawVulnerability>>,
    #[serde(default)]
    pub scan_duration: Option<f64>,
    #[serde(default)]
    pub vulnerability_breakdown: Option<RawBreakdown>,
}
