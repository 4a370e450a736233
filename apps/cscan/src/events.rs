//! Event handling and progress display

use crate::logging::log_event_with_tracing;
use console::{Style, Term};
use cscan_events::{AppEvent, CatalogEvent, EventMessage, GeneralEvent, ScanEvent};
use cscan_types::ScanStatus;

/// Event handler for progress display and user feedback
pub struct EventHandler {
    term: Term,
    colors_enabled: bool,
    debug_enabled: bool,
    /// Suppress progress output entirely (JSON mode)
    quiet: bool,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, debug_enabled: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors_enabled,
            debug_enabled,
            quiet,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        log_event_with_tracing(&message);
        if self.quiet {
            return;
        }

        match message.event {
            AppEvent::Scan(event) => self.handle_scan_event(event),
            AppEvent::Catalog(CatalogEvent::Unavailable { failure }) => {
                self.show_warning(&format!("Example images unavailable: {}", failure.message));
            }
            AppEvent::Catalog(CatalogEvent::Loaded { .. }) => {}
            AppEvent::General(event) => self.handle_general_event(event),
        }
    }

    fn handle_scan_event(&self, event: ScanEvent) {
        match event {
            ScanEvent::Submitted {
                scan_id,
                image_reference,
            } => {
                self.show_status(&format!("Scanning {image_reference} (scan {scan_id})"));
            }
            ScanEvent::StatusChanged {
                status,
                progress_percent,
                message,
                vulnerabilities_found_so_far,
                ..
            } => {
                let mut line = format!("[{:>3}%] {:<10} {message}", progress_percent, status.as_str());
                if vulnerabilities_found_so_far > 0 {
                    line.push_str(&format!(" ({vulnerabilities_found_so_far} found)"));
                }
                match status {
                    ScanStatus::Failed => self.show_error(&line),
                    ScanStatus::Completed => self.show_success(&line),
                    _ => self.show_status(&line),
                }
            }
            ScanEvent::PollFailed { failure, .. } => {
                self.show_warning(&format!("Status check failed, retrying: {}", failure.message));
            }
            ScanEvent::ResultFetchFailed { failure, .. } => {
                self.show_error(&format!("Could not fetch scan result: {}", failure.message));
            }
            ScanEvent::ConsistencyWarning { details, .. } => {
                if self.debug_enabled {
                    for detail in details {
                        self.show_warning(&detail);
                    }
                }
            }
            ScanEvent::Completed { result, .. } => {
                self.show_success(&format!(
                    "Scan of {} complete: {} vulnerabilities",
                    result.image_reference, result.total_vulnerability_count
                ));
            }
            ScanEvent::Cancelled { scan_id } => {
                self.show_warning(&format!("Stopped polling scan {scan_id}"));
            }
        }
    }

    fn handle_general_event(&self, event: GeneralEvent) {
        match event {
            GeneralEvent::Warning { message, context } => match context {
                Some(context) if self.debug_enabled => {
                    self.show_warning(&format!("{message}: {context}"));
                }
                _ => self.show_warning(&message),
            },
            GeneralEvent::Error { message, .. } => self.show_error(&message),
            GeneralEvent::OperationFailed { operation, error } => {
                self.show_error(&format!("{operation} failed: {error}"));
            }
            GeneralEvent::DebugLog { message, .. } if self.debug_enabled => {
                self.show_status(&message);
            }
            _ => {}
        }
    }

    fn show_status(&self, line: &str) {
        self.write(line, None);
    }

    fn show_success(&self, line: &str) {
        self.write(line, Some(Style::new().green()));
    }

    fn show_warning(&self, line: &str) {
        self.write(line, Some(Style::new().yellow()));
    }

    fn show_error(&self, line: &str) {
        self.write(line, Some(Style::new().red()));
    }

    fn write(&self, line: &str, style: Option<Style>) {
        let line = match style {
            Some(style) if self.colors_enabled => style.apply_to(line).to_string(),
            _ => line.to_string(),
        };
        // stderr keeps stdout clean for the final report
        let _ = self.term.write_line(&line);
    }
}
