//! Scan backend contract and its HTTP implementation

use async_trait::async_trait;
use cscan_errors::{Error, NetworkError, ScanError};
use cscan_types::wire::{RawScanResult, SubmitRequestBody, SubmitResponseBody};
use cscan_types::{BackendHealth, CatalogEntry, ScanId, ScanRequest, StatusSnapshot};

use url::Url;

use crate::client::{decode_json, error_message, NetClient};
use crate::parse_url;

const SUBMIT_PATH: &[&str] = &["api", "scan-image"];
const STATUS_PATH: &[&str] = &["api", "scan-status"];
const RESULT_PATH: &[&str] = &["api", "scan-result"];
const STORED_PATH: &[&str] = &["api", "scan"];
const CATALOG_PATH: &[&str] = &["api", "popular-images"];
const HEALTH_PATH: &[&str] = &["api", "health"];

/// Message used when the backend rejects a scan without explaining why
pub const DEFAULT_REJECTION_MESSAGE: &str = "Failed to start scan";

/// Everything the client needs from a scan backend.
///
/// The session controller only talks to this trait, so tests can script a
/// backend in memory and the CLI can plug in [`HttpBackend`].
#[async_trait]
pub trait ScanBackend: Send + Sync {
    /// Create a scan job.
    ///
    /// A rejection must be reported as `ScanError::SubmissionRejected`.
    async fn submit(&self, request: &ScanRequest) -> Result<ScanId, Error>;

    /// Fetch the latest status snapshot for a scan.
    async fn status(&self, scan_id: &ScanId) -> Result<StatusSnapshot, Error>;

    /// Fetch the raw result payload of a completed scan.
    async fn result(&self, scan_id: &ScanId) -> Result<RawScanResult, Error>;

    /// Fetch a report the backend keeps on disk under `name`.
    ///
    /// Stored reports are finished results; no session is involved.
    async fn stored_scan(&self, name: &str) -> Result<RawScanResult, Error>;

    /// Fetch the example-image catalog.
    async fn catalog(&self) -> Result<Vec<CatalogEntry>, Error>;

    /// Probe backend health.
    async fn health(&self) -> Result<BackendHealth, Error>;
}

/// JSON-over-HTTP scan backend
#[derive(Clone)]
pub struct HttpBackend {
    client: NetClient,
    base_url: Url,
}

impl HttpBackend {
    /// Create a backend rooted at `base_url`
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::InvalidUrl` if `base_url` does not parse or
    /// cannot carry a path (`mailto:` and the like).
    pub fn new(client: NetClient, base_url: &str) -> Result<Self, Error> {
        let base_url = parse_url(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(NetworkError::InvalidUrl(format!(
                "{base_url} cannot be used as a base URL"
            ))
            .into());
        }
        Ok(Self { client, base_url })
    }

    /// Append `path` and then `tail` to the base URL's path.
    ///
    /// Each segment is percent-encoded, so backend-assigned ids and report
    /// names containing `/`, `?` or `#` stay inside their own segment.
    fn endpoint(&self, path: &[&str], tail: Option<&str>) -> Result<String, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| NetworkError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(path)
            .extend(tail);
        Ok(url.into())
    }

    fn url(&self, path: &[&str]) -> Result<String, Error> {
        self.endpoint(path, None)
    }

    fn scan_url(&self, path: &[&str], scan_id: &ScanId) -> Result<String, Error> {
        self.endpoint(path, Some(scan_id.as_str()))
    }
}

#[async_trait]
impl ScanBackend for HttpBackend {
    async fn submit(&self, request: &ScanRequest) -> Result<ScanId, Error> {
        let url = self.url(SUBMIT_PATH)?;
        let body = SubmitRequestBody {
            image_name: request.image_reference().to_string(),
        };

        tracing::debug!(%url, image = request.image_reference(), "submitting scan");
        let response = self.client.post_json(&url, &body).await?;
        let status = response.status();

        if !status.is_success() {
            let message = error_message(response)
                .await
                .unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_string());
            return Err(ScanError::SubmissionRejected {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let accepted: SubmitResponseBody = decode_json(response, &url).await?;
        match accepted.scan_id {
            Some(id) if !id.trim().is_empty() => Ok(ScanId::new(id)),
            _ => Err(ScanError::MissingScanId.into()),
        }
    }

    async fn status(&self, scan_id: &ScanId) -> Result<StatusSnapshot, Error> {
        self.client
            .get_json(&self.scan_url(STATUS_PATH, scan_id)?)
            .await
    }

    async fn result(&self, scan_id: &ScanId) -> Result<RawScanResult, Error> {
        self.client
            .get_json(&self.scan_url(RESULT_PATH, scan_id)?)
            .await
    }

    async fn stored_scan(&self, name: &str) -> Result<RawScanResult, Error> {
        let url = self.endpoint(STORED_PATH, Some(name))?;
        tracing::debug!(%url, name, "fetching stored report");
        self.client.get_json(&url).await
    }

    async fn catalog(&self) -> Result<Vec<CatalogEntry>, Error> {
        self.client.get_json(&self.url(CATALOG_PATH)?).await
    }

    async fn health(&self) -> Result<BackendHealth, Error> {
        self.client.get_json(&self.url(HEALTH_PATH)?).await
    }
}
