//! Scripted in-memory scan backend

#![allow(dead_code)]

use async_trait::async_trait;
use cscan_errors::{Error, NetworkError, ScanError};
use cscan_events::{AppEvent, EventReceiver, ScanEvent};
use cscan_net::ScanBackend;
use cscan_types::wire::RawScanResult;
use cscan_types::{BackendHealth, CatalogEntry, ScanId, ScanRequest, ScanStatus, StatusSnapshot};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;

pub type StatusReply = Result<StatusSnapshot, Error>;

/// Backend whose replies are queued up front by the test
#[derive(Default)]
pub struct ScriptedBackend {
    pub submit_reply: Mutex<Option<Result<ScanId, Error>>>,
    pub statuses: Mutex<VecDeque<StatusReply>>,
    pub result_reply: Mutex<Option<Result<RawScanResult, Error>>>,
    pub catalog_reply: Mutex<Option<Result<Vec<CatalogEntry>, Error>>>,
    pub status_delay: Mutex<Option<Duration>>,
    pub gate: Option<Arc<Semaphore>>,
    pub submit_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub result_calls: AtomicUsize,
    pub catalog_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub status_started_at: Mutex<Vec<Instant>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepting(scan_id: &str) -> Self {
        let backend = Self::new();
        *backend.submit_reply.lock().unwrap() = Some(Ok(ScanId::new(scan_id)));
        backend
    }

    /// Every later submission is refused with `message`.
    pub fn reject_submissions(&self, message: &str) {
        *self.submit_reply.lock().unwrap() = Some(Err(ScanError::SubmissionRejected {
            status: 400,
            message: message.into(),
        }
        .into()));
    }

    /// Status requests wait for a permit on the returned semaphore.
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn push_status(&self, status: ScanStatus, progress: i64) {
        self.statuses
            .lock()
            .unwrap()
            .push_back(Ok(StatusSnapshot::new(status, progress)));
    }

    pub fn push_snapshot(&self, snapshot: StatusSnapshot) {
        self.statuses.lock().unwrap().push_back(Ok(snapshot));
    }

    pub fn push_failure(&self) {
        self.statuses
            .lock()
            .unwrap()
            .push_back(Err(NetworkError::ConnectionRefused("localhost:5001".into()).into()));
    }

    pub fn set_result(&self, result: Result<RawScanResult, Error>) {
        *self.result_reply.lock().unwrap() = Some(result);
    }

    pub fn set_status_delay(&self, delay: Duration) {
        *self.status_delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScanBackend for ScriptedBackend {
    async fn submit(&self, _request: &ScanRequest) -> Result<ScanId, Error> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submit_reply.lock().unwrap().clone().unwrap_or_else(|| {
            Err(ScanError::SubmissionRejected {
                status: 400,
                message: "Failed to start scan".into(),
            }
            .into())
        })
    }

    async fn status(&self, _scan_id: &ScanId) -> Result<StatusSnapshot, Error> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status_started_at.lock().unwrap().push(Instant::now());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.unwrap();
            permit.forget();
        }
        let delay = *self.status_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(NetworkError::RequestFailed("script exhausted".into()).into()))
    }

    async fn result(&self, _scan_id: &ScanId) -> Result<RawScanResult, Error> {
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        self.result_reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(RawScanResult::default()))
    }

    async fn stored_scan(&self, name: &str) -> Result<RawScanResult, Error> {
        Err(NetworkError::HttpError {
            status: 404,
            message: format!("Scan file not found: {name}.json"),
        }
        .into())
    }

    async fn catalog(&self) -> Result<Vec<CatalogEntry>, Error> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        self.catalog_reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn health(&self) -> Result<BackendHealth, Error> {
        Ok(BackendHealth {
            status: "healthy".into(),
            message: String::new(),
        })
    }
}

/// Every event currently queued on the receiver.
pub fn drain(rx: &mut EventReceiver) -> Vec<AppEvent> {
    let mut events = Vec::new();
    while let Ok(message) = rx.try_recv() {
        events.push(message.event);
    }
    events
}

/// Only the scan lifecycle events.
pub fn scan_events(rx: &mut EventReceiver) -> Vec<ScanEvent> {
    drain(rx)
        .into_iter()
        .filter_map(|event| match event {
            AppEvent::Scan(event) => Some(event),
            _ => None,
        })
        .collect()
}
