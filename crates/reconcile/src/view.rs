//! Severity filtering and display limiting

use cscan_types::{ScanResult, Severity, VulnerabilityRecord};

/// Records with exactly `severity`, in their original order.
#[must_use]
pub fn filter_by_severity(result: &ScanResult, severity: Severity) -> Vec<&VulnerabilityRecord> {
    result
        .vulnerabilities
        .iter()
        .filter(|v| v.severity == severity)
        .collect()
}

/// A bounded slice of a result's records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitedView<'a> {
    pub records: Vec<&'a VulnerabilityRecord>,
    /// All records matching the filter, shown or not
    pub count: usize,
    pub omitted: usize,
}

impl LimitedView<'_> {
    #[must_use]
    pub fn shown(&self) -> usize {
        self.records.len()
    }
}

/// At most `limit` records matching `filter`, plus how many were left out.
#[must_use]
pub fn view(result: &ScanResult, filter: Option<Severity>, limit: usize) -> LimitedView<'_> {
    let matching: Vec<&VulnerabilityRecord> = match filter {
        Some(severity) => filter_by_severity(result, severity),
        None => result.vulnerabilities.iter().collect(),
    };
    let count = matching.len();
    let records: Vec<_> = matching.into_iter().take(limit).collect();
    let omitted = count - records.len();

    LimitedView {
        records,
        count,
        omitted,
    }
}
