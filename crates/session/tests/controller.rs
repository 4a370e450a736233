//! Scan controller behaviour against a scripted backend

mod support;

use cscan_config::ScanConfig;
use cscan_errors::{Error, ScanError};
use cscan_events::ScanEvent;
use cscan_session::{ScanController, ScanOutcome, SessionUpdate};
use cscan_types::wire::RawScanResult;
use cscan_types::{ScanStatus, StatusSnapshot};
use std::sync::Arc;
use std::time::Duration;
use support::{scan_events, ScriptedBackend};
use tokio::time::Instant;

const INTERVAL: Duration = Duration::from_millis(2000);

fn config() -> ScanConfig {
    ScanConfig {
        poll_interval_ms: 2000,
        ..ScanConfig::default()
    }
}

fn nginx_result() -> RawScanResult {
    serde_json::from_value(serde_json::json!({
        "scan_id": "abc123",
        "image_name": "nginx:latest",
        "scan_date": "2024-05-01T10:15:30.123456",
        "severity_counts": {"CRITICAL": 1, "HIGH": 1},
        "total_vulnerabilities": 2,
        "vulnerabilities": [
            {"id": "CVE-2023-0001", "severity": "CRITICAL", "package": "openssl",
             "installed_version": "3.0.2", "fixed_version": "3.0.8"},
            {"id": "CVE-2023-0002", "severity": "HIGH", "package": "zlib",
             "installed_version": "1.2.11"}
        ],
        "scan_duration": 12.5
    }))
    .unwrap()
}

fn controller(backend: &Arc<ScriptedBackend>) -> (ScanController, cscan_events::EventReceiver) {
    let (tx, rx) = cscan_events::channel();
    let backend: Arc<dyn cscan_net::ScanBackend> = backend.clone();
    (ScanController::new(backend, &config(), tx), rx)
}

fn completed_count(events: &[ScanEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ScanEvent::Completed { .. }))
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_submit_starts_session() {
    let backend = Arc::new(ScriptedBackend::accepting("abc123"));
    let (mut controller, mut rx) = controller(&backend);

    let scan_id = controller.submit("  nginx:latest ").await.unwrap();
    let session = controller.session().unwrap();

    assert_eq!(scan_id.as_str(), "abc123");
    assert_eq!(session.status, ScanStatus::Starting);
    assert_eq!(session.progress_percent, 0);
    assert_eq!(session.image_reference, "nginx:latest");
    assert!(controller.is_active());

    let events = scan_events(&mut rx);
    assert!(matches!(
        events.as_slice(),
        [ScanEvent::Submitted { image_reference, .. }] if image_reference == "nginx:latest"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_blank_reference_never_reaches_backend() {
    let backend = Arc::new(ScriptedBackend::accepting("abc123"));
    let (mut controller, _rx) = controller(&backend);

    let err = controller.submit("   ").await.unwrap_err();

    assert!(err.is_validation());
    assert!(matches!(err, Error::Scan(ScanError::EmptyImageReference)));
    assert_eq!(ScriptedBackend::calls(&backend.submit_calls), 0);
    assert!(controller.session().is_none());
    assert!(!controller.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_rejected_submission_creates_no_session() {
    let backend = Arc::new(ScriptedBackend::new());
    let (mut controller, _rx) = controller(&backend);

    let err = controller.submit("nginx:latest").await.unwrap_err();

    assert!(matches!(
        err,
        Error::Scan(ScanError::SubmissionRejected { ref message, .. }) if message == "Failed to start scan"
    ));
    assert!(controller.session().is_none());
    assert!(!controller.is_active());
    assert!(controller.next_update().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_completed_scan_fetches_once_and_records_history() {
    let backend = Arc::new(ScriptedBackend::accepting("abc123"));
    backend.push_status(ScanStatus::Pulling, 10);
    backend.push_status(ScanStatus::Scanning, 30);
    backend.push_status(ScanStatus::Processing, 80);
    backend.push_snapshot(
        StatusSnapshot::new(ScanStatus::Completed, 100).with_message("Scan completed!"),
    );
    backend.set_result(Ok(nginx_result()));
    let (mut controller, mut rx) = controller(&backend);

    controller.submit("nginx:latest").await.unwrap();
    let outcome = controller.run_to_completion().await;

    let ScanOutcome::Completed(result) = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(result.image_reference, "nginx:latest");
    assert_eq!(result.total_vulnerability_count, 2);
    assert_eq!(ScriptedBackend::calls(&backend.result_calls), 1);
    assert_eq!(ScriptedBackend::calls(&backend.status_calls), 4);
    assert!(!controller.is_active());

    assert_eq!(controller.history().len(), 1);
    assert_eq!(controller.history().latest().unwrap(), &*result);

    let events = scan_events(&mut rx);
    assert_eq!(completed_count(&events), 1);
    assert!(matches!(events.last(), Some(ScanEvent::Completed { .. })));
    let statuses: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::StatusChanged { status, .. } => Some(*status),
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            ScanStatus::Pulling,
            ScanStatus::Scanning,
            ScanStatus::Processing,
            ScanStatus::Completed
        ]
    );

    // nothing more happens after the terminal state
    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(ScriptedBackend::calls(&backend.status_calls), 4);
    assert!(controller.next_update().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_nginx_pulling_then_completed() {
    let backend = Arc::new(ScriptedBackend::accepting("abc123"));
    backend.push_status(ScanStatus::Pulling, 10);
    backend.push_status(ScanStatus::Completed, 100);
    backend.set_result(Ok(nginx_result()));
    let (mut controller, mut rx) = controller(&backend);

    controller.submit("nginx:latest").await.unwrap();
    assert_eq!(controller.session().unwrap().status, ScanStatus::Starting);

    let update = controller.next_update().await.unwrap();
    assert!(matches!(update, SessionUpdate::Status(ScanStatus::Pulling)));
    let session = controller.session().unwrap();
    assert_eq!((session.status, session.progress_percent), (ScanStatus::Pulling, 10));
    assert_eq!(ScriptedBackend::calls(&backend.result_calls), 0);

    let update = controller.next_update().await.unwrap();
    assert!(matches!(update, SessionUpdate::Status(ScanStatus::Completed)));
    let update = controller.next_update().await.unwrap();
    assert!(matches!(update, SessionUpdate::Completed(_)));

    assert_eq!(ScriptedBackend::calls(&backend.result_calls), 1);
    assert_eq!(controller.history().len(), 1);
    assert_eq!(
        controller.history().get(0).unwrap().image_reference,
        "nginx:latest"
    );
    assert_eq!(completed_count(&scan_events(&mut rx)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_scan_never_fetches_or_completes() {
    let backend = Arc::new(ScriptedBackend::accepting("abc123"));
    backend.push_status(ScanStatus::Pulling, 10);
    backend.push_snapshot(
        StatusSnapshot::new(ScanStatus::Failed, 10)
            .with_message("Timeout while pulling image (>5 minutes)"),
    );
    let (mut controller, mut rx) = controller(&backend);

    controller.submit("nginx:latest").await.unwrap();
    let outcome = controller.run_to_completion().await;

    let ScanOutcome::Failed(session) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(session.status, ScanStatus::Failed);
    assert_eq!(session.message, "Timeout while pulling image (>5 minutes)");
    assert_eq!(ScriptedBackend::calls(&backend.result_calls), 0);
    assert!(controller.history().is_empty());
    assert_eq!(completed_count(&scan_events(&mut rx)), 0);

    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(ScriptedBackend::calls(&backend.status_calls), 2);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried() {
    let backend = Arc::new(ScriptedBackend::accepting("abc123"));
    backend.push_failure();
    backend.push_status(ScanStatus::Scanning, 30);
    backend.push_failure();
    backend.push_status(ScanStatus::Completed, 100);
    backend.set_result(Ok(nginx_result()));
    let (mut controller, mut rx) = controller(&backend);

    controller.submit("nginx:latest").await.unwrap();

    let first = controller.next_update().await.unwrap();
    assert!(matches!(first, SessionUpdate::PollFailed(_)));
    assert_eq!(controller.session().unwrap().status, ScanStatus::Starting);
    assert!(controller.is_active());

    let outcome = controller.run_to_completion().await;
    assert!(matches!(outcome, ScanOutcome::Completed(_)));
    assert_eq!(ScriptedBackend::calls(&backend.status_calls), 4);

    let events = scan_events(&mut rx);
    let failures = events
        .iter()
        .filter(|e| matches!(e, ScanEvent::PollFailed { .. }))
        .count();
    assert_eq!(failures, 2);
    assert_eq!(completed_count(&events), 1);
}

#[tokio::test(start_paused = true)]
async fn test_one_outstanding_request_and_interval_from_settlement() {
    let backend = Arc::new(ScriptedBackend::accepting("abc123"));
    let delay = Duration::from_secs(5);
    backend.set_status_delay(delay);
    for progress in [30, 40, 50] {
        backend.push_status(ScanStatus::Scanning, progress);
    }
    backend.push_status(ScanStatus::Completed, 100);
    let (mut controller, _rx) = controller(&backend);

    let started = Instant::now();
    controller.submit("python:3.11").await.unwrap();
    controller.run_to_completion().await;

    assert_eq!(backend.max_in_flight.load(std::sync::atomic::Ordering::SeqCst), 1);

    let starts = backend.status_started_at.lock().unwrap().clone();
    assert_eq!(starts.len(), 4);
    assert!(starts[0] - started >= INTERVAL);
    for pair in starts.windows(2) {
        assert!(pair[1] - pair[0] >= INTERVAL + delay);
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancel_discards_in_flight_response() {
    let (backend, gate) = ScriptedBackend::accepting("abc123").gated();
    let backend = Arc::new(backend);
    backend.push_status(ScanStatus::Completed, 100);
    backend.set_result(Ok(nginx_result()));
    let (mut controller, mut rx) = controller(&backend);

    controller.submit("nginx:latest").await.unwrap();
    tokio::time::sleep(INTERVAL + Duration::from_millis(100)).await;
    assert_eq!(ScriptedBackend::calls(&backend.status_calls), 1);

    controller.cancel();
    gate.add_permits(1);
    tokio::time::sleep(INTERVAL * 5).await;

    assert!(!controller.is_active());
    assert!(controller.next_update().await.is_none());
    assert_eq!(controller.session().unwrap().status, ScanStatus::Starting);
    assert_eq!(ScriptedBackend::calls(&backend.result_calls), 0);
    assert!(controller.history().is_empty());

    let events = scan_events(&mut rx);
    assert!(matches!(
        events.as_slice(),
        [ScanEvent::Submitted { .. }, ScanEvent::Cancelled { .. }]
    ));
}

#[tokio::test(start_paused = true)]
async fn test_resubmit_cancels_previous_and_drops_stale_messages() {
    let backend = Arc::new(ScriptedBackend::accepting("abc123"));
    backend.push_status(ScanStatus::Scanning, 30);
    backend.push_status(ScanStatus::Completed, 100);
    backend.set_result(Ok(nginx_result()));
    let (mut controller, mut rx) = controller(&backend);

    controller.submit("redis:7-alpine").await.unwrap();
    // the first poller delivers a snapshot that is never applied
    tokio::time::sleep(INTERVAL + Duration::from_millis(100)).await;
    controller.submit("nginx:latest").await.unwrap();
    assert_eq!(controller.session().unwrap().image_reference, "nginx:latest");

    let first = controller.next_update().await.unwrap();
    assert!(matches!(first, SessionUpdate::Status(ScanStatus::Completed)));
    assert!(matches!(
        controller.run_to_completion().await,
        ScanOutcome::Completed(_)
    ));

    let events = scan_events(&mut rx);
    let kinds: Vec<&str> = events
        .iter()
        .map(|e| match e {
            ScanEvent::Submitted { .. } => "submitted",
            ScanEvent::Cancelled { .. } => "cancelled",
            ScanEvent::StatusChanged { .. } => "status",
            ScanEvent::Completed { .. } => "completed",
            _ => "other",
        })
        .filter(|k| *k != "other")
        .collect();
    assert_eq!(
        kinds,
        vec!["submitted", "cancelled", "submitted", "status", "completed"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_rejected_resubmit_keeps_running_scan() {
    let backend = Arc::new(ScriptedBackend::accepting("abc123"));
    backend.push_status(ScanStatus::Completed, 100);
    backend.set_result(Ok(nginx_result()));
    let (mut controller, mut rx) = controller(&backend);

    controller.submit("nginx:latest").await.unwrap();
    backend.reject_submissions("Invalid image name");
    let err = controller.submit("bad::ref").await.unwrap_err();

    assert!(matches!(
        err,
        Error::Scan(ScanError::SubmissionRejected { ref message, .. }) if message == "Invalid image name"
    ));
    assert!(controller.is_active());
    let session = controller.session().unwrap();
    assert_eq!(session.scan_id.as_str(), "abc123");
    assert_eq!(session.image_reference, "nginx:latest");

    assert!(matches!(
        controller.run_to_completion().await,
        ScanOutcome::Completed(_)
    ));
    let events = scan_events(&mut rx);
    assert!(!events
        .iter()
        .any(|e| matches!(e, ScanEvent::Cancelled { .. })));
    assert_eq!(completed_count(&events), 1);
}

#[tokio::test(start_paused = true)]
async fn test_progress_is_advisory() {
    let backend = Arc::new(ScriptedBackend::accepting("abc123"));
    backend.push_status(ScanStatus::Scanning, 80);
    backend.push_status(ScanStatus::Pulling, 30);
    backend.push_status(ScanStatus::Processing, 150);
    let (mut controller, _rx) = controller(&backend);
    controller.submit("node:18").await.unwrap();

    let mut seen = Vec::new();
    for _ in 0..3 {
        controller.next_update().await.unwrap();
        let session = controller.session().unwrap();
        seen.push((session.status, session.progress_percent));
    }

    assert_eq!(
        seen,
        vec![
            (ScanStatus::Scanning, 80),
            (ScanStatus::Pulling, 30),
            (ScanStatus::Processing, 100)
        ]
    );
    controller.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_result_fetch_failure_is_not_completion() {
    let backend = Arc::new(ScriptedBackend::accepting("abc123"));
    backend.push_status(ScanStatus::Completed, 100);
    backend.set_result(Err(cscan_errors::NetworkError::Timeout {
        url: "http://localhost:5001/api/scan-result/abc123".into(),
    }
    .into()));
    let (mut controller, mut rx) = controller(&backend);

    controller.submit("nginx:latest").await.unwrap();
    let outcome = controller.run_to_completion().await;

    assert!(matches!(outcome, ScanOutcome::ResultUnavailable(_)));
    assert!(!controller.is_active());
    assert!(controller.history().is_empty());
    assert_eq!(controller.session().unwrap().status, ScanStatus::Completed);

    let events = scan_events(&mut rx);
    assert_eq!(completed_count(&events), 0);
    assert!(events
        .iter()
        .any(|e| matches!(e, ScanEvent::ResultFetchFailed { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_inconsistent_result_warns_but_completes() {
    let backend = Arc::new(ScriptedBackend::accepting("abc123"));
    backend.push_status(ScanStatus::Completed, 100);
    let mut raw = nginx_result();
    raw.total_vulnerabilities = Some(250);
    raw.severity_counts = Some([("CRITICAL".to_string(), 1), ("HIGH".to_string(), 249)].into());
    backend.set_result(Ok(raw));
    let (mut controller, mut rx) = controller(&backend);

    controller.submit("nginx:latest").await.unwrap();
    let outcome = controller.run_to_completion().await;
    let ScanOutcome::Completed(result) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(result.severity_counts.high, 249);
    assert_eq!(result.vulnerabilities.len(), 2);

    let events = scan_events(&mut rx);
    let warning = events.iter().find_map(|e| match e {
        ScanEvent::ConsistencyWarning { details, .. } => Some(details.clone()),
        _ => None,
    });
    assert!(warning.unwrap().iter().any(|d| d.starts_with("HIGH")));
    assert_eq!(completed_count(&events), 1);
}

#[tokio::test(start_paused = true)]
async fn test_controllers_share_nothing() {
    let first = Arc::new(ScriptedBackend::accepting("one"));
    first.push_status(ScanStatus::Completed, 100);
    first.set_result(Ok(nginx_result()));
    let second = Arc::new(ScriptedBackend::accepting("two"));
    second.push_status(ScanStatus::Failed, 10);

    let (mut a, _rx_a) = controller(&first);
    let (mut b, _rx_b) = controller(&second);
    a.submit("nginx:latest").await.unwrap();
    b.submit("mysql:8").await.unwrap();

    let (outcome_a, outcome_b) = tokio::join!(a.run_to_completion(), b.run_to_completion());

    assert!(matches!(outcome_a, ScanOutcome::Completed(_)));
    assert!(matches!(outcome_b, ScanOutcome::Failed(_)));
    assert_eq!(a.history().len(), 1);
    assert!(b.history().is_empty());
}
