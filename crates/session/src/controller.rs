//! Scan session controller

use cscan_config::ScanConfig;
use cscan_errors::Error;
use cscan_events::{EventEmitter, EventSender, FailureContext, ScanEvent};
use cscan_net::ScanBackend;
use cscan_reconcile::{check_consistency, normalize};
use cscan_types::wire::RawScanResult;
use cscan_types::{ScanId, ScanRequest, ScanResult, ScanSession, ScanStatus, StatusSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::history::ScanHistory;
use crate::poller::{Envelope, PollerHandle, PollerMessage};

/// What applying one poller message did to the session
#[derive(Debug, Clone)]
pub enum SessionUpdate {
    /// A status snapshot was applied
    Status(ScanStatus),
    /// A poll failed; the next tick retries
    PollFailed(Error),
    /// The scan failed on the backend side
    Failed,
    /// The result was fetched, reconciled and recorded
    Completed(Box<ScanResult>),
    /// The scan completed but its result could not be fetched
    ResultUnavailable(Error),
}

impl SessionUpdate {
    /// Whether the session stopped being active with this update.
    #[must_use]
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Failed | Self::Completed(_) | Self::ResultUnavailable(_)
        )
    }
}

/// How a session ended
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Completed(Box<ScanResult>),
    /// Terminal `failed` status; the session keeps the backend's message
    Failed(ScanSession),
    ResultUnavailable(Error),
    /// No session was active, or it was cancelled
    Inactive,
}

struct ActivePoll {
    generation: u64,
    poller: PollerHandle,
}

/// Drives one scan at a time from submission to a terminal state.
///
/// The controller is the only writer of its session and history. Poller
/// messages are applied in the order they arrive; anything tagged with an
/// older generation than the active session is discarded.
pub struct ScanController {
    backend: Arc<dyn ScanBackend>,
    poll_interval: Duration,
    tx: EventSender,
    history: ScanHistory,
    session: Option<ScanSession>,
    active: Option<ActivePoll>,
    generation: u64,
    poll_tx: UnboundedSender<Envelope>,
    poll_rx: UnboundedReceiver<Envelope>,
}

impl EventEmitter for ScanController {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

impl ScanController {
    #[must_use]
    pub fn new(backend: Arc<dyn ScanBackend>, config: &ScanConfig, tx: EventSender) -> Self {
        let (poll_tx, poll_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            poll_interval: config.poll_interval(),
            tx,
            history: ScanHistory::with_capacity(config.history_capacity),
            session: None,
            active: None,
            generation: 0,
            poll_tx,
            poll_rx,
        }
    }

    /// Start scanning `image_reference`.
    ///
    /// A session that is still active keeps running until the backend accepts
    /// the new scan, and is cancelled then. On success the new session starts
    /// in `starting` at 0% and polling begins one interval later.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::EmptyImageReference` without contacting the
    /// backend if the reference is blank after trimming,
    /// `ScanError::SubmissionRejected` if the backend refuses the scan, and a
    /// network error if the request could not be delivered. No session is
    /// created and the active one is left untouched in any of these cases.
    pub async fn submit(&mut self, image_reference: &str) -> Result<ScanId, Error> {
        let request = ScanRequest::new(image_reference)?;
        let scan_id = self.backend.submit(&request).await?;

        self.cancel();
        self.generation += 1;

        tracing::info!(
            scan_id = %scan_id,
            image = request.image_reference(),
            generation = self.generation,
            "scan accepted"
        );

        self.session = Some(ScanSession::starting(scan_id.clone(), &request));
        self.active = Some(ActivePoll {
            generation: self.generation,
            poller: PollerHandle::spawn(
                Arc::clone(&self.backend),
                scan_id.clone(),
                self.generation,
                self.poll_interval,
                self.poll_tx.clone(),
            ),
        });

        self.emit_scan(ScanEvent::Submitted {
            scan_id: scan_id.clone(),
            image_reference: request.image_reference().to_string(),
        });

        Ok(scan_id)
    }

    /// Stop polling the active session.
    ///
    /// The backend is not told. The session keeps its last state and will
    /// never change or complete again. Does nothing when no session is active.
    pub fn cancel(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        active.poller.cancel();
        if let Some(session) = &self.session {
            tracing::info!(scan_id = %session.scan_id, "scan cancelled");
            self.emit_scan(ScanEvent::Cancelled {
                scan_id: session.scan_id.clone(),
            });
        }
    }

    /// The current or most recent session.
    #[must_use]
    pub fn session(&self) -> Option<&ScanSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn history(&self) -> &ScanHistory {
        &self.history
    }

    /// Wait for and apply the next message from the active session's poller.
    ///
    /// Returns `None` when no session is active.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        loop {
            let generation = self.active.as_ref()?.generation;
            let envelope = self.poll_rx.recv().await?;
            if envelope.generation != generation {
                tracing::trace!(
                    stale = envelope.generation,
                    current = generation,
                    "dropping message from a previous session"
                );
                continue;
            }
            return Some(self.apply(envelope.message));
        }
    }

    /// Apply updates until the active session ends.
    pub async fn run_to_completion(&mut self) -> ScanOutcome {
        while let Some(update) = self.next_update().await {
            match update {
                SessionUpdate::Completed(result) => return ScanOutcome::Completed(result),
                SessionUpdate::ResultUnavailable(error) => {
                    return ScanOutcome::ResultUnavailable(error)
                }
                SessionUpdate::Failed => {
                    return self
                        .session
                        .clone()
                        .map_or(ScanOutcome::Inactive, ScanOutcome::Failed);
                }
                SessionUpdate::Status(_) | SessionUpdate::PollFailed(_) => {}
            }
        }
        ScanOutcome::Inactive
    }

    fn apply(&mut self, message: PollerMessage) -> SessionUpdate {
        match message {
            PollerMessage::Snapshot(snapshot) => self.apply_snapshot(&snapshot),
            PollerMessage::TransientFailure(error) => {
                let scan_id = self.current_scan_id();
                tracing::warn!(scan_id = %scan_id, %error, "status poll failed, retrying");
                self.emit_scan(ScanEvent::PollFailed {
                    scan_id,
                    failure: FailureContext::from_error(&error),
                });
                SessionUpdate::PollFailed(error)
            }
            PollerMessage::ResultFetched(raw) => self.complete(raw),
            PollerMessage::ResultFetchFailed(error) => {
                self.active = None;
                let scan_id = self.current_scan_id();
                tracing::warn!(scan_id = %scan_id, %error, "result fetch failed");
                self.emit_scan(ScanEvent::ResultFetchFailed {
                    scan_id,
                    failure: FailureContext::from_error(&error),
                });
                SessionUpdate::ResultUnavailable(error)
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: &StatusSnapshot) -> SessionUpdate {
        let Some(session) = self.session.as_mut() else {
            return SessionUpdate::Status(snapshot.status);
        };
        session.apply(snapshot);
        tracing::debug!(
            scan_id = %session.scan_id,
            status = session.status.as_str(),
            progress = session.progress_percent,
            "status applied"
        );
        let event = ScanEvent::status_changed(session);
        self.emit_scan(event);

        if snapshot.status == ScanStatus::Failed {
            self.active = None;
            return SessionUpdate::Failed;
        }
        SessionUpdate::Status(snapshot.status)
    }

    fn complete(&mut self, raw: RawScanResult) -> SessionUpdate {
        self.active = None;
        let scan_id = self.current_scan_id();
        let mut result = normalize(raw);
        if result.scan_id.is_none() {
            result.scan_id = Some(scan_id.clone());
        }
        if result.image_reference.is_empty() {
            if let Some(session) = &self.session {
                result.image_reference.clone_from(&session.image_reference);
            }
        }

        let report = check_consistency(&result);
        if !report.is_consistent() {
            tracing::info!(scan_id = %scan_id, "result summary and detail disagree");
            self.emit_scan(ScanEvent::ConsistencyWarning {
                scan_id: scan_id.clone(),
                details: report.describe(),
            });
        }

        self.history.push(result.clone());
        let result = Box::new(result);
        self.emit_scan(ScanEvent::Completed {
            scan_id,
            result: result.clone(),
        });
        SessionUpdate::Completed(result)
    }

    fn current_scan_id(&self) -> ScanId {
        self.session
            .as_ref()
            .map_or_else(|| ScanId::new(""), |s| s.scan_id.clone())
    }
}
