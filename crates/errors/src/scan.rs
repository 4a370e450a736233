//! Scan submission error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Errors returned synchronously from scan submission.
///
/// Anything that goes wrong after the backend accepted a scan is reported
/// through session state and events instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScanError {
    #[error("image reference is empty")]
    EmptyImageReference,

    #[error("scan rejected by backend ({status}): {message}")]
    SubmissionRejected { status: u16, message: String },

    #[error("backend accepted the scan but returned no scan id")]
    MissingScanId,
}

impl ScanError {
    /// Whether this is a local validation failure (no network call was made).
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyImageReference)
    }
}

impl UserFacingError for ScanError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::SubmissionRejected { message, .. } => Cow::Borrowed(message.as_str()),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::EmptyImageReference => {
                Some("Provide an image reference such as nginx:latest.")
            }
            Self::SubmissionRejected { status, .. } if *status >= 500 => {
                Some("The backend may be at capacity; try again later.")
            }
            Self::SubmissionRejected { .. } => Some("Check the image reference and retry."),
            Self::MissingScanId => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::SubmissionRejected { status, .. } if *status >= 500)
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::EmptyImageReference => "scan.empty_image_reference",
            Self::SubmissionRejected { .. } => "scan.submission_rejected",
            Self::MissingScanId => "scan.missing_scan_id",
        };
        Some(code)
    }
}
