//! Structured logging integration for events
//!
//! Converts domain events into tracing records with structured fields so
//! `--debug` logs carry the same information the progress display shows.

use cscan_events::{AppEvent, CatalogEvent, EventMessage, GeneralEvent, ScanEvent};
use tracing::{debug, error, info, warn};

/// Log an event using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    let event = &message.event;
    let meta = &message.meta;

    match event {
        AppEvent::Scan(scan_event) => match scan_event {
            ScanEvent::Submitted {
                scan_id,
                image_reference,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    scan_id = %scan_id,
                    image = %image_reference,
                    "Scan submitted"
                );
            }
            ScanEvent::StatusChanged {
                scan_id,
                status,
                progress_percent,
                vulnerabilities_found_so_far,
                ..
            } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    scan_id = %scan_id,
                    status = status.as_str(),
                    progress = progress_percent,
                    found = vulnerabilities_found_so_far,
                    "Scan status"
                );
            }
            ScanEvent::PollFailed { scan_id, failure } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    scan_id = %scan_id,
                    code = ?failure.code,
                    message = %failure.message,
                    "Status poll failed"
                );
            }
            ScanEvent::ResultFetchFailed { scan_id, failure } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    scan_id = %scan_id,
                    code = ?failure.code,
                    message = %failure.message,
                    retryable = failure.retryable,
                    "Result fetch failed"
                );
            }
            ScanEvent::ConsistencyWarning { scan_id, details } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    scan_id = %scan_id,
                    discrepancies = details.len(),
                    "Result summary and detail disagree"
                );
            }
            ScanEvent::Completed { scan_id, result } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    scan_id = %scan_id,
                    total = result.total_vulnerability_count,
                    listed = result.vulnerabilities.len(),
                    "Scan completed"
                );
            }
            ScanEvent::Cancelled { scan_id } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    scan_id = %scan_id,
                    "Scan cancelled"
                );
            }
        },

        AppEvent::Catalog(catalog_event) => match catalog_event {
            CatalogEvent::Loaded { entries } => {
                debug!(source = meta.source.as_str(), entries, "Catalog loaded");
            }
            CatalogEvent::Unavailable { failure } => {
                warn!(
                    source = meta.source.as_str(),
                    message = %failure.message,
                    "Catalog unavailable"
                );
            }
        },

        AppEvent::General(general_event) => match general_event {
            GeneralEvent::Warning { message, context } => {
                warn!(source = meta.source.as_str(), context = ?context, "{message}");
            }
            GeneralEvent::Error { message, details } => {
                error!(source = meta.source.as_str(), details = ?details, "{message}");
            }
            GeneralEvent::DebugLog { message, context } => {
                debug!(source = meta.source.as_str(), context = ?context, "{message}");
            }
            GeneralEvent::OperationStarted { operation } => {
                info!(source = meta.source.as_str(), operation = %operation, "Operation started");
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                info!(
                    source = meta.source.as_str(),
                    operation = %operation,
                    success,
                    "Operation completed"
                );
            }
            GeneralEvent::OperationFailed { operation, error } => {
                error!(
                    source = meta.source.as_str(),
                    operation = %operation,
                    error = %error,
                    "Operation failed"
                );
            }
        },
    }
}
