//! Boundary normalization of raw result payloads

use chrono::{DateTime, NaiveDateTime, Utc};
use cscan_types::wire::{RawBreakdown, RawScanResult, RawVulnerability};
use cscan_types::{
    FixedVersion, ResultBreakdown, ScanId, ScanResult, Severity, SeverityCounts,
    VulnerabilityRecord,
};

/// Turn a raw result payload into the canonical [`ScanResult`].
///
/// Never fails. Missing counts read as 0, a missing total becomes the sum of
/// the counts, and a missing or unparseable timestamp becomes `None`.
#[must_use]
pub fn normalize(raw: RawScanResult) -> ScanResult {
    let severity_counts = normalize_counts(raw.severity_counts.as_ref());
    let total_vulnerability_count = raw
        .total_vulnerabilities
        .unwrap_or_else(|| severity_counts.total());

    let vulnerabilities: Vec<VulnerabilityRecord> = raw
        .vulnerabilities
        .unwrap_or_default()
        .into_iter()
        .map(normalize_record)
        .collect();

    let scan_timestamp = raw.scan_date.as_deref().and_then(parse_timestamp);
    if raw.scan_date.is_some() && scan_timestamp.is_none() {
        tracing::debug!(scan_date = ?raw.scan_date, "unparseable scan timestamp");
    }

    ScanResult {
        scan_id: raw
            .scan_id
            .filter(|id| !id.trim().is_empty())
            .map(ScanId::new),
        image_reference: raw.image_name.unwrap_or_default(),
        scan_timestamp,
        severity_counts,
        total_vulnerability_count,
        vulnerabilities,
        scan_duration_secs: raw.scan_duration,
        breakdown: raw.vulnerability_breakdown.map(normalize_breakdown),
    }
}

fn normalize_counts(
    raw: Option<&std::collections::BTreeMap<String, u64>>,
) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    let Some(raw) = raw else {
        return counts;
    };
    for (key, count) in raw {
        match Severity::parse(key) {
            Some(Severity::Unknown) | None => {
                tracing::debug!(key = %key, count, "ignoring unknown severity bucket");
            }
            Some(severity) => counts.set(severity, *count),
        }
    }
    counts
}

fn normalize_record(raw: RawVulnerability) -> VulnerabilityRecord {
    let severity = raw
        .severity
        .as_deref()
        .or(raw.severity_capitalized.as_deref())
        .and_then(Severity::parse)
        .unwrap_or(Severity::Unknown);

    VulnerabilityRecord {
        id: raw.id.unwrap_or_default(),
        severity,
        title: raw.title.unwrap_or_default(),
        affected_package: raw.package.unwrap_or_default(),
        installed_version: raw.installed_version.unwrap_or_default(),
        fixed_version: FixedVersion::from_wire(raw.fixed_version.as_deref()),
    }
}

fn normalize_breakdown(raw: RawBreakdown) -> ResultBreakdown {
    ResultBreakdown {
        critical_expected: raw.critical_expected,
        critical_returned: raw.critical_returned,
        high_returned: raw.high_returned,
        total_returned: raw.total_returned,
        total_available: raw.total_available,
    }
}

/// RFC 3339, or a naive ISO-8601 timestamp taken as UTC.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
