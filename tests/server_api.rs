// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! End-to-end REST checks over a real listener: raw HTTP/1.1 requests
//! against the served router, backed by a throwaway project directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use flowplan::api;
use flowplan::store::{FlowchartDir, FlowchartStore};
use flowplan::sync::{spawn_relay, ChangeBroadcaster};

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let pid = std::process::id();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut path = std::env::temp_dir();
        path.push(format!("flowplan-{prefix}-{pid}-{nanos}-{counter}"));
        fs::create_dir_all(&path).expect("create temp dir");

        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

struct TestServer {
    addr: std::net::SocketAddr,
    store: Arc<FlowchartStore>,
}

async fn serve(tmp: &TempDir) -> TestServer {
    let store = Arc::new(FlowchartStore::new(FlowchartDir::new(tmp.path())));
    let broadcaster = ChangeBroadcaster::new();
    spawn_relay(store.clone(), broadcaster.clone());
    let router = api::router(store.clone(), broadcaster);

    let listener = TcpListener::bind(("127.0.0.1", 0)).await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    TestServer { addr, store }
}

/// One request, `Connection: close`, response read to EOF.
async fn request(
    server: &TestServer,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> (u16, serde_json::Value) {
    let mut stream = TcpStream::connect(server.addr).await.expect("connect");

    let body = body.unwrap_or("");
    let raw = format!(
        "{method} {path} HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: close\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(raw.as_bytes()).await.expect("write");

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.expect("read");
    let response = String::from_utf8(response).expect("utf8 response");

    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .expect("status code");
    let payload = response
        .split_once("\r\n\r\n")
        .map(|(_, payload)| payload)
        .unwrap_or("");
    let value = if payload.trim().is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_str(payload.trim()).expect("json body")
    };
    (status, value)
}

#[tokio::test]
async fn list_starts_empty() {
    let tmp = TempDir::new("it-list-empty");
    let server = serve(&tmp).await;

    let (status, body) = request(&server, "GET", "/api/flowcharts", None).await;
    assert_eq!(status, 200);
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn upsert_creates_then_updates_and_get_round_trips() {
    let tmp = TempDir::new("it-upsert");
    let server = serve(&tmp).await;

    let (status, created) = request(
        &server,
        "PUT",
        "/api/flowchart/deploy-plan",
        Some(r#"{"name": "Deploy Plan"}"#),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(created["id"], "deploy-plan");
    assert_eq!(created["version"], 1);

    let (status, updated) = request(
        &server,
        "PUT",
        "/api/flowchart/deploy-plan",
        Some(r#"{"engineeringMode": true}"#),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(updated["version"], 2);
    assert_eq!(updated["engineeringMode"], true);
    assert_eq!(updated["name"], "Deploy Plan");

    let (status, fetched) = request(&server, "GET", "/api/flowchart/deploy-plan", None).await;
    assert_eq!(status, 200);
    assert_eq!(fetched, updated);

    // And it really is one file on disk under the project storage directory.
    let on_disk = tmp
        .path()
        .join(".claude")
        .join("flowplans")
        .join("deploy-plan.json");
    assert!(on_disk.is_file());
}

#[tokio::test]
async fn get_unknown_flowchart_is_404() {
    let tmp = TempDir::new("it-404");
    let server = serve(&tmp).await;

    let (status, body) = request(&server, "GET", "/api/flowchart/ghost", None).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Flowchart 'ghost' not found");
}

#[tokio::test]
async fn list_shows_upserted_summaries() {
    let tmp = TempDir::new("it-list");
    let server = serve(&tmp).await;

    request(
        &server,
        "PUT",
        "/api/flowchart/alpha",
        Some(r#"{"name": "Alpha"}"#),
    )
    .await;
    request(
        &server,
        "PUT",
        "/api/flowchart/beta",
        Some(r#"{"name": "Beta"}"#),
    )
    .await;

    let (status, body) = request(&server, "GET", "/api/flowcharts", None).await;
    assert_eq!(status, 200);
    let entries = body.as_array().expect("array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], "alpha");
    assert_eq!(entries[0]["name"], "Alpha");
    assert_eq!(entries[1]["id"], "beta");
}

#[tokio::test]
async fn mutations_through_the_store_reach_rest_readers() {
    let tmp = TempDir::new("it-store-rest");
    let server = serve(&tmp).await;

    let id = server
        .store
        .create("From The Agent", "", Some("basic"), None)
        .await
        .expect("create");

    let (status, body) = request(
        &server,
        "GET",
        &format!("/api/flowchart/{id}"),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["nodes"].as_array().map(Vec::len), Some(2));
}
