//! Mock scan backend built on httpmock
//!
//! Serves the backend's JSON API so the whole pipeline (HTTP client,
//! controller, poller, reconciler) runs against real requests.

#![allow(dead_code)]

use cscan_config::{Config, ScanConfig};
use cscan_events::{AppEvent, EventReceiver, ScanEvent};
use cscan_net::{HttpBackend, NetClient, NetConfig, ScanBackend};
use cscan_session::ScanController;
use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::{json, Value};
use std::sync::Arc;

pub const POLL_INTERVAL_MS: u64 = 20;

pub struct MockBackend {
    pub server: MockServer,
}

impl MockBackend {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start_async().await,
        }
    }

    pub fn backend(&self) -> Arc<dyn ScanBackend> {
        let mut config = Config::default();
        config.backend.base_url = self.server.base_url();
        let client = NetClient::new(&NetConfig::from(&config)).unwrap();
        Arc::new(HttpBackend::new(client, config.backend_url()).unwrap())
    }

    pub fn controller(&self) -> (ScanController, EventReceiver) {
        let (tx, rx) = cscan_events::channel();
        let scan = ScanConfig {
            poll_interval_ms: POLL_INTERVAL_MS,
            ..ScanConfig::default()
        };
        (ScanController::new(self.backend(), &scan, tx), rx)
    }

    pub async fn accept(&self, image: &str, scan_id: &str) -> Mock<'_> {
        let image = image.to_string();
        let scan_id = scan_id.to_string();
        self.server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/scan-image")
                    .json_body(json!({ "image_name": image }));
                then.status(200).json_body(json!({
                    "scan_id": scan_id,
                    "image_name": image,
                    "status": "started",
                    "message": "Scan initiated successfully"
                }));
            })
            .await
    }

    pub async fn status(&self, scan_id: &str, body: Value) -> Mock<'_> {
        let path = format!("/api/scan-status/{scan_id}");
        self.server
            .mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(200).json_body(body);
            })
            .await
    }

    pub async fn status_error(&self, scan_id: &str, code: u16) -> Mock<'_> {
        let path = format!("/api/scan-status/{scan_id}");
        self.server
            .mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(code).body("upstream error");
            })
            .await
    }

    pub async fn result(&self, scan_id: &str, body: Value) -> Mock<'_> {
        let path = format!("/api/scan-result/{scan_id}");
        self.server
            .mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(200).json_body(body);
            })
            .await
    }
}

impl MockBackend {
    pub async fn stored(&self, name: &str, body: Value) -> Mock<'_> {
        let path = format!("/api/scan/{name}");
        self.server
            .mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(200).json_body(body);
            })
            .await
    }
}

pub fn status_body(status: &str, progress: i64, message: &str) -> Value {
    json!({
        "status": status,
        "progress": progress,
        "message": message,
        "image_name": "nginx:latest",
        "start_time": "2024-05-01T10:00:00.000000"
    })
}

/// Result payload shaped like a trimmed Trivy report: the backend found 250
/// vulnerabilities but only lists a handful.
pub fn nginx_result(scan_id: &str) -> Value {
    json!({
        "scan_id": scan_id,
        "image_name": "nginx:latest",
        "scan_date": "2024-05-01T10:02:41.512345",
        "severity_counts": {"CRITICAL": 2, "HIGH": 18, "MEDIUM": 80, "LOW": 150},
        "total_vulnerabilities": 250,
        "vulnerabilities": [
            {"id": "CVE-2023-44487", "severity": "CRITICAL", "title": "HTTP/2 rapid reset",
             "package": "nghttp2", "installed_version": "1.52.0", "fixed_version": "1.57.0"},
            {"id": "CVE-2023-38545", "severity": "CRITICAL", "title": "SOCKS5 heap overflow",
             "package": "curl", "installed_version": "7.88.1", "fixed_version": "8.4.0"},
            {"id": "CVE-2023-5363", "severity": "HIGH", "title": "openssl key length",
             "package": "openssl", "installed_version": "3.0.11", "fixed_version": ""},
            {"id": "CVE-2022-3715", "Severity": "MEDIUM", "title": "bash heap overflow",
             "package": "bash", "installed_version": "5.2.15"}
        ],
        "scan_duration": 161.4,
        "vulnerability_breakdown": {
            "critical_returned": 2, "critical_expected": 2, "high_returned": 1,
            "total_returned": 4, "total_available": 250
        }
    })
}

pub fn scan_events(rx: &mut EventReceiver) -> Vec<ScanEvent> {
    let mut events = Vec::new();
    while let Ok(message) = rx.try_recv() {
        if let AppEvent::Scan(event) = message.event {
            events.push(event);
        }
    }
    events
}
