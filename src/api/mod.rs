// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! REST and WebSocket surface.
//!
//! Three document endpoints and the `/ws` push channel, all backed by the
//! same store the MCP tools use. The REST PUT is the upsert path the visual
//! editor saves through; `/ws` is where it hears about everyone else's
//! changes.

pub mod port;

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::model::{DocumentPatch, FlowchartDocument, FlowchartId, FlowchartSummary};
use crate::store::{FlowchartStore, StoreError};
use crate::sync::ChangeBroadcaster;

pub use port::{
    bind_project_port, derived_port, preferred_port, PortFile, PORT_ENV_VAR, PORT_RANGE_END,
    PORT_RANGE_START,
};

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<FlowchartStore>,
    pub broadcaster: ChangeBroadcaster,
}

/// Builds the REST + WebSocket router. The MCP service is nested next to
/// this by the caller.
pub fn router(store: Arc<FlowchartStore>, broadcaster: ChangeBroadcaster) -> Router {
    Router::new()
        .route("/api/flowcharts", get(list_flowcharts))
        .route(
            "/api/flowchart/{id}",
            get(get_flowchart).put(put_flowchart),
        )
        .route("/ws", get(ws_upgrade))
        .with_state(ApiState { store, broadcaster })
}

type ApiError = (StatusCode, Json<Value>);

fn error_body(message: impl std::fmt::Display) -> Json<Value> {
    Json(serde_json::json!({ "error": message.to_string() }))
}

fn store_error_response(err: StoreError) -> ApiError {
    let status = match &err {
        StoreError::NotFound { .. } | StoreError::NodeNotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::InvalidName { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error_body(err))
}

/// An id that cannot even be a flowchart id names nothing; same answer as a
/// well-formed id with no file behind it.
fn parse_id(raw: &str) -> Result<FlowchartId, ApiError> {
    FlowchartId::new(raw).map_err(|_| {
        (
            StatusCode::NOT_FOUND,
            error_body(format_args!("Flowchart '{raw}' not found")),
        )
    })
}

async fn list_flowcharts(
    State(state): State<ApiState>,
) -> Result<Json<Vec<FlowchartSummary>>, ApiError> {
    state.store.list().map(Json).map_err(store_error_response)
}

async fn get_flowchart(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<FlowchartDocument>, ApiError> {
    let id = parse_id(&id)?;
    match state.store.read(&id).map_err(store_error_response)? {
        Some(doc) => Ok(Json(doc)),
        None => Err(store_error_response(StoreError::NotFound { id })),
    }
}

async fn put_flowchart(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(patch): Json<DocumentPatch>,
) -> Result<Json<FlowchartDocument>, ApiError> {
    let id = parse_id(&id)?;
    state
        .store
        .upsert(&id, patch)
        .await
        .map(Json)
        .map_err(store_error_response)
}

async fn ws_upgrade(State(state): State<ApiState>, upgrade: WebSocketUpgrade) -> impl IntoResponse {
    let frames = state.broadcaster.subscribe();
    upgrade.on_upgrade(move |socket| push_updates(socket, frames))
}

/// Forwards update frames to one connection until it closes or errors. A
/// lagged receiver skips missed frames and keeps going; the client
/// re-fetches over REST if it cares.
async fn push_updates(socket: WebSocket, mut frames: broadcast::Receiver<Arc<str>>) {
    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(frame) => {
                    if sink.send(Message::Text(frame.as_ref().into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Ping(payload))) => {
                    if sink.send(Message::Pong(payload)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FlowchartDir;
    use crate::sync::spawn_relay;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

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
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    fn state_in(tmp: &TempDir) -> ApiState {
        ApiState {
            store: Arc::new(FlowchartStore::new(FlowchartDir::new(&tmp.path))),
            broadcaster: ChangeBroadcaster::new(),
        }
    }

    fn patch(value: serde_json::Value) -> DocumentPatch {
        serde_json::from_value(value).expect("patch decodes")
    }

    #[tokio::test]
    async fn upsert_creates_then_updates() {
        let tmp = TempDir::new("api-upsert");
        let state = state_in(&tmp);

        let Json(created) = put_flowchart(
            State(state.clone()),
            Path("pushed".to_string()),
            Json(patch(serde_json::json!({ "name": "Pushed" }))),
        )
        .await
        .expect("create");
        assert_eq!(created.id().as_str(), "pushed");
        assert_eq!(created.version(), 1);

        let Json(updated) = put_flowchart(
            State(state.clone()),
            Path("pushed".to_string()),
            Json(patch(serde_json::json!({ "engineeringMode": true }))),
        )
        .await
        .expect("update");
        assert_eq!(updated.version(), 2);
        assert!(updated.engineering_mode());
    }

    #[tokio::test]
    async fn get_unknown_id_is_404_with_error_body() {
        let tmp = TempDir::new("api-404");
        let state = state_in(&tmp);

        let (status, Json(body)) = get_flowchart(State(state), Path("ghost".to_string()))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Flowchart 'ghost' not found");
    }

    #[tokio::test]
    async fn get_malformed_id_is_404() {
        let tmp = TempDir::new("api-badid");
        let state = state_in(&tmp);

        let (status, _) = get_flowchart(State(state), Path("no/slashes".to_string()))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_reflects_upserts() {
        let tmp = TempDir::new("api-list");
        let state = state_in(&tmp);

        put_flowchart(
            State(state.clone()),
            Path("one".to_string()),
            Json(patch(serde_json::json!({ "name": "One" }))),
        )
        .await
        .expect("create one");
        put_flowchart(
            State(state.clone()),
            Path("two".to_string()),
            Json(patch(serde_json::json!({ "name": "Two" }))),
        )
        .await
        .expect("create two");

        let Json(summaries) = list_flowcharts(State(state)).await.expect("list");
        let ids = summaries
            .iter()
            .map(|s| s.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn upsert_reaches_websocket_subscribers_as_update_frames() {
        let tmp = TempDir::new("api-frames");
        let state = state_in(&tmp);
        let relay = spawn_relay(state.store.clone(), state.broadcaster.clone());
        let mut frames = state.broadcaster.subscribe();

        put_flowchart(
            State(state.clone()),
            Path("live".to_string()),
            Json(patch(serde_json::json!({ "name": "Live" }))),
        )
        .await
        .expect("create");

        let frame = tokio::time::timeout(Duration::from_secs(2), frames.recv())
            .await
            .expect("frame within deadline")
            .expect("frame");
        let value: serde_json::Value = serde_json::from_str(&frame).expect("json");
        assert_eq!(value["type"], "flowchart_update");
        assert_eq!(value["id"], "live");
        assert_eq!(value["data"]["name"], "Live");

        relay.abort();
    }
}
