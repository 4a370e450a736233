use serde::{Deserialize, Serialize};

use crate::EventSource;
use cscan_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code, when the error provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod catalog;
pub mod general;
pub mod scan;

pub use catalog::*;
pub use general::*;
pub use scan::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Scan session lifecycle
    Scan(ScanEvent),

    /// Example-image catalog
    Catalog(CatalogEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Scan(_) => EventSource::SCAN,
            Self::Catalog(_) => EventSource::CATALOG,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::Error { .. } | GeneralEvent::OperationFailed { .. })
            | Self::Scan(ScanEvent::ResultFetchFailed { .. }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Scan(ScanEvent::PollFailed { .. } | ScanEvent::ConsistencyWarning { .. })
            | Self::Catalog(CatalogEvent::Unavailable { .. }) => Level::WARN,

            Self::Scan(ScanEvent::StatusChanged { status, .. })
                if *status == cscan_types::ScanStatus::Failed =>
            {
                Level::ERROR
            }

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Scan(ScanEvent::StatusChanged { .. }) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "cscan::events::general",
            Self::Scan(_) => "cscan::events::scan",
            Self::Catalog(_) => "cscan::events::catalog",
        }
    }

    /// Correlation id for the event, when it belongs to a scan session.
    #[must_use]
    pub fn correlation_id(&self) -> Option<String> {
        match self {
            Self::Scan(event) => Some(event.scan_id().to_string()),
            _ => None,
        }
    }
}
