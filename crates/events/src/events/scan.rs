use cscan_types::{ScanId, ScanResult, ScanSession, ScanStatus};
use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Scan session lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    /// Backend accepted the scan; polling is about to start
    Submitted {
        scan_id: ScanId,
        image_reference: String,
    },

    /// A status snapshot was applied to the active session
    StatusChanged {
        scan_id: ScanId,
        status: ScanStatus,
        progress_percent: u8,
        message: String,
        vulnerabilities_found_so_far: u64,
    },

    /// One status poll failed at the transport level; polling continues
    PollFailed {
        scan_id: ScanId,
        failure: FailureContext,
    },

    /// The session completed but its result payload could not be retrieved
    ResultFetchFailed {
        scan_id: ScanId,
        failure: FailureContext,
    },

    /// Summary counts and detailed records disagree for a completed scan
    ConsistencyWarning {
        scan_id: ScanId,
        details: Vec<String>,
    },

    /// Scan finished and its normalized result is available.
    ///
    /// Fired at most once per session, and never for failed scans.
    Completed {
        scan_id: ScanId,
        result: Box<ScanResult>,
    },

    /// Polling was abandoned client-side
    Cancelled { scan_id: ScanId },
}

impl ScanEvent {
    /// Status-change event mirroring the current session state.
    #[must_use]
    pub fn status_changed(session: &ScanSession) -> Self {
        Self::StatusChanged {
            scan_id: session.scan_id.clone(),
            status: session.status,
            progress_percent: session.progress_percent,
            message: session.message.clone(),
            vulnerabilities_found_so_far: session.vulnerabilities_found_so_far,
        }
    }

    #[must_use]
    pub fn scan_id(&self) -> &ScanId {
        match self {
            Self::Submitted { scan_id, .. }
            | Self::StatusChanged { scan_id, .. }
            | Self::PollFailed { scan_id, .. }
            | Self::ResultFetchFailed { scan_id, .. }
            | Self::ConsistencyWarning { scan_id, .. }
            | Self::Completed { scan_id, .. }
            | Self::Cancelled { scan_id } => scan_id,
        }
    }
}
