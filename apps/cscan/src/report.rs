//! Results produced by CLI commands

use cscan_reconcile::{check_consistency, ConsistencyReport, ScanComparison};
use cscan_types::{BackendHealth, CatalogEntry, ScanResult, Severity};
use serde::Serialize;

/// A completed scan together with how it should be displayed
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub result: ScanResult,
    pub consistency: ConsistencyReport,
    pub severity_filter: Option<Severity>,
    pub limit: usize,
}

impl ScanReport {
    pub fn new(result: ScanResult, severity_filter: Option<Severity>, limit: usize) -> Self {
        let consistency = check_consistency(&result);
        Self {
            result,
            consistency,
            severity_filter,
            limit,
        }
    }
}

/// Side-by-side scan of two images
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub baseline: ScanResult,
    pub candidate: ScanResult,
    pub comparison: ScanComparison,
}

/// Output of any CLI command
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CommandResult {
    Scan(Box<ScanReport>),
    Catalog(Vec<CatalogEntry>),
    Comparison(Box<ComparisonReport>),
    Health(BackendHealth),
}

impl CommandResult {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
