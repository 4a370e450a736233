//! Status poller task
//!
//! One poller runs per session. It sleeps for the poll interval, issues a
//! single status request, forwards the outcome and repeats, so the interval
//! is measured from the settlement of one poll to the start of the next and
//! there is never more than one request in flight.

use cscan_errors::Error;
use cscan_net::ScanBackend;
use cscan_types::wire::RawScanResult;
use cscan_types::{ScanId, ScanStatus, StatusSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What the poller reports back to the controller
#[derive(Debug)]
pub(crate) enum PollerMessage {
    Snapshot(StatusSnapshot),
    /// A poll failed at the transport level; the poller keeps going.
    TransientFailure(Error),
    ResultFetched(RawScanResult),
    ResultFetchFailed(Error),
}

/// A poller message tagged with the session it belongs to
#[derive(Debug)]
pub(crate) struct Envelope {
    pub generation: u64,
    pub message: PollerMessage,
}

/// Handle to a running poller
pub(crate) struct PollerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn spawn(
        backend: Arc<dyn ScanBackend>,
        scan_id: ScanId,
        generation: u64,
        interval: Duration,
        tx: UnboundedSender<Envelope>,
    ) -> Self {
        let token = CancellationToken::new();
        let poller = Poller {
            backend,
            scan_id,
            generation,
            interval,
            tx,
            token: token.clone(),
        };
        let task = tokio::spawn(poller.run());
        Self { token, task }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
        self.task.abort();
    }
}

struct Poller {
    backend: Arc<dyn ScanBackend>,
    scan_id: ScanId,
    generation: u64,
    interval: Duration,
    tx: UnboundedSender<Envelope>,
    token: CancellationToken,
}

impl Poller {
    async fn run(self) {
        tracing::debug!(scan_id = %self.scan_id, generation = self.generation, "poller started");

        loop {
            tokio::select! {
                biased;
                () = self.token.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {}
            }

            let outcome = tokio::select! {
                biased;
                () = self.token.cancelled() => break,
                outcome = self.backend.status(&self.scan_id) => outcome,
            };

            match outcome {
                Ok(snapshot) => {
                    let status = snapshot.status;
                    if !self.forward(PollerMessage::Snapshot(snapshot)) {
                        break;
                    }
                    match status {
                        ScanStatus::Failed => break,
                        ScanStatus::Completed => {
                            self.fetch_result().await;
                            break;
                        }
                        _ => {}
                    }
                }
                Err(error) => {
                    tracing::debug!(scan_id = %self.scan_id, %error, "status poll failed");
                    if !self.forward(PollerMessage::TransientFailure(error)) {
                        break;
                    }
                }
            }
        }

        tracing::debug!(scan_id = %self.scan_id, generation = self.generation, "poller stopped");
    }

    async fn fetch_result(&self) {
        let outcome = tokio::select! {
            biased;
            () = self.token.cancelled() => return,
            outcome = self.backend.result(&self.scan_id) => outcome,
        };
        let message = match outcome {
            Ok(raw) => PollerMessage::ResultFetched(raw),
            Err(error) => PollerMessage::ResultFetchFailed(error),
        };
        self.forward(message);
    }

    /// Send unless cancelled. Returns false once the poller should stop.
    fn forward(&self, message: PollerMessage) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        self.tx
            .send(Envelope {
                generation: self.generation,
                message,
            })
            .is_ok()
    }
}
