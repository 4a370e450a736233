//! Scan request and session lifecycle types

use cscan_errors::{Error, ScanError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, backend-assigned scan identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(String);

impl ScanId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated request to scan one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    image_reference: String,
}

impl ScanRequest {
    /// Build a request from user input, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::EmptyImageReference` if nothing is left after trimming.
    pub fn new(image_reference: &str) -> Result<Self, Error> {
        let trimmed = image_reference.trim();
        if trimmed.is_empty() {
            return Err(ScanError::EmptyImageReference.into());
        }
        Ok(Self {
            image_reference: trimmed.to_string(),
        })
    }

    #[must_use]
    pub fn image_reference(&self) -> &str {
        &self.image_reference
    }
}

/// Lifecycle status reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Starting,
    Pulling,
    Scanning,
    Processing,
    Completed,
    Failed,
}

impl ScanStatus {
    /// `completed` and `failed` end a session; nothing follows them.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Pulling => "pulling",
            Self::Scanning => "scanning",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded status poll response.
///
/// Fields other than `status` are optional on the wire; absent values fall
/// back to their zero value when applied to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: ScanStatus,
    #[serde(
        default,
        rename = "progress",
        alias = "progressPercent",
        alias = "progress_percent"
    )]
    pub progress_percent: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(
        default,
        rename = "vulnerabilities_found",
        alias = "vulnerabilitiesFoundSoFar",
        alias = "vulnerabilities_found_so_far"
    )]
    pub vulnerabilities_found_so_far: Option<u64>,
}

impl StatusSnapshot {
    /// Snapshot with only a status and progress, as most backends send mid-scan.
    #[must_use]
    pub fn new(status: ScanStatus, progress_percent: i64) -> Self {
        Self {
            status,
            progress_percent: Some(progress_percent),
            message: None,
            vulnerabilities_found_so_far: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Client-side view of one backend scan job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSession {
    pub scan_id: ScanId,
    pub image_reference: String,
    pub status: ScanStatus,
    pub progress_percent: u8,
    pub message: String,
    pub vulnerabilities_found_so_far: u64,
}

impl ScanSession {
    /// A freshly accepted session, before the first poll response.
    #[must_use]
    pub fn starting(scan_id: ScanId, request: &ScanRequest) -> Self {
        Self {
            scan_id,
            image_reference: request.image_reference().to_string(),
            status: ScanStatus::Starting,
            progress_percent: 0,
            message: "Initializing scan...".to_string(),
            vulnerabilities_found_so_far: 0,
        }
    }

    /// Replace the backend-owned fields with `snapshot`.
    ///
    /// This is a full replace: fields absent from the snapshot reset to their
    /// zero value. Progress is clamped into `0..=100` and may go backwards.
    pub fn apply(&mut self, snapshot: &StatusSnapshot) {
        self.status = snapshot.status;
        self.progress_percent = clamp_progress(snapshot.progress_percent.unwrap_or(0));
        self.message = snapshot.message.clone().unwrap_or_default();
        self.vulnerabilities_found_so_far = snapshot.vulnerabilities_found_so_far.unwrap_or(0);
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

fn clamp_progress(value: i64) -> u8 {
    // clamp keeps the value in 0..=100, so the cast is lossless
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        value.clamp(0, 100) as u8
    }
}
