//! Example-image catalog client

use cscan_events::{AppEvent, CatalogEvent, EventEmitter, EventSender, FailureContext};
use cscan_net::ScanBackend;
use cscan_types::CatalogEntry;
use std::sync::Arc;

/// Fetches the example-image catalog once and caches it.
///
/// A failed fetch is cached as an empty catalog and never retried; the
/// failure is reported as a [`CatalogEvent::Unavailable`] plus a warning.
pub struct CatalogClient {
    backend: Arc<dyn ScanBackend>,
    tx: EventSender,
    entries: Option<Vec<CatalogEntry>>,
}

impl EventEmitter for CatalogClient {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

impl CatalogClient {
    #[must_use]
    pub fn new(backend: Arc<dyn ScanBackend>, tx: EventSender) -> Self {
        Self {
            backend,
            tx,
            entries: None,
        }
    }

    /// Catalog entries, fetching them on first use.
    pub async fn entries(&mut self) -> &[CatalogEntry] {
        if self.entries.is_none() {
            let fetched = self.fetch().await;
            self.entries = Some(fetched);
        }
        self.entries.as_deref().unwrap_or_default()
    }

    /// Whether a fetch has been attempted.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.entries.is_some()
    }

    async fn fetch(&self) -> Vec<CatalogEntry> {
        match self.backend.catalog().await {
            Ok(entries) => {
                tracing::debug!(count = entries.len(), "catalog loaded");
                self.emit(AppEvent::Catalog(CatalogEvent::Loaded {
                    entries: entries.len(),
                }));
                entries
            }
            Err(error) => {
                tracing::warn!(%error, "catalog unavailable");
                self.emit(AppEvent::Catalog(CatalogEvent::Unavailable {
                    failure: FailureContext::from_error(&error),
                }));
                self.emit_warning_with_context("Example image catalog unavailable", error.to_string());
                Vec::new()
            }
        }
    }
}
