// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::model::{FlowchartDocument, FlowchartId};
use crate::store::{FlowchartStore, StoreEvent};

const FRAME_CHANNEL_CAPACITY: usize = 64;

/// The push message clients receive over the WebSocket.
#[derive(Debug, Serialize)]
struct UpdateEnvelope<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: &'a FlowchartId,
    data: &'a FlowchartDocument,
}

/// Serializes one store event into the `flowchart_update` wire frame.
pub fn update_frame(event: &StoreEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&UpdateEnvelope {
        kind: "flowchart_update",
        id: &event.id,
        data: &event.document,
    })
}

/// Fans pre-serialized update frames out to WebSocket connections.
///
/// Each document change is serialized exactly once by the relay task and
/// shared by `Arc` with every subscriber. There is no buffering or replay: a
/// subscriber that joins late or lags re-fetches current state over REST.
#[derive(Debug, Clone)]
pub struct ChangeBroadcaster {
    frames: broadcast::Sender<Arc<str>>,
}

impl ChangeBroadcaster {
    pub fn new() -> Self {
        let (frames, _) = broadcast::channel(FRAME_CHANNEL_CAPACITY);
        Self { frames }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<str>> {
        self.frames.subscribe()
    }

    /// Serializes and publishes one event. Publishing with no subscribers is
    /// not an error; the frame is simply dropped.
    pub fn publish(&self, event: &StoreEvent) -> Result<(), serde_json::Error> {
        let frame: Arc<str> = Arc::from(update_frame(event)?);
        let _ = self.frames.send(frame);
        Ok(())
    }
}

impl Default for ChangeBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Relays store change events into the broadcaster until the store's event
/// channel closes. A frame that fails to serialize is dropped; a lagged
/// relay skips missed events, matching the no-replay contract.
pub fn spawn_relay(store: Arc<FlowchartStore>, broadcaster: ChangeBroadcaster) -> JoinHandle<()> {
    let mut events = store.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Err(err) = broadcaster.publish(&event) {
                        eprintln!("flowplan: failed to serialize update frame: {err}");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
