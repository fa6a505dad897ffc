// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::*;

use crate::model::DocumentPatch;
use crate::store::FlowchartDir;
use crate::sync::{spawn_relay, spawn_watcher, ChangeBroadcaster};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;

static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

const E2E_PORT: u16 = 9542;
const FRAME_DEADLINE: Duration = Duration::from_secs(5);

fn new_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_all().build().expect("tokio runtime")
}

struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = std::env::temp_dir();
        path.push(format!("flowplan-e2e-{prefix}-{}-{nanos}-{counter}", std::process::id()));
        std::fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

struct EditorHarness {
    tmp: TempDir,
    store: Arc<FlowchartStore>,
    broadcaster: ChangeBroadcaster,
}

impl EditorHarness {
    fn new(prefix: &str) -> Self {
        let tmp = TempDir::new(prefix);
        let store = Arc::new(FlowchartStore::new(FlowchartDir::new(tmp.path())));
        Self { tmp, store, broadcaster: ChangeBroadcaster::new() }
    }

    fn server(&self) -> FlowplanMcp {
        FlowplanMcp::new(Arc::clone(&self.store), E2E_PORT)
    }

    /// A second store on the same project directory, standing in for another
    /// flowplan process.
    fn second_store(&self) -> Arc<FlowchartStore> {
        Arc::new(FlowchartStore::new(FlowchartDir::new(self.tmp.path())))
    }

    fn frames(&self) -> broadcast::Receiver<Arc<str>> {
        self.broadcaster.subscribe()
    }
}

async fn next_frame(frames: &mut broadcast::Receiver<Arc<str>>) -> serde_json::Value {
    let frame = tokio::time::timeout(FRAME_DEADLINE, frames.recv())
        .await
        .expect("update frame within deadline")
        .expect("update frame");
    serde_json::from_str(&frame).expect("frame json")
}

#[test]
fn e2e_agent_edits_stream_to_editor_subscribers_in_order() {
    let runtime = new_runtime();
    let harness = EditorHarness::new("agent-stream");
    let server = harness.server();

    // The editor page attaches its socket before the agent starts editing.
    let mut frames = harness.frames();
    let relay = runtime.block_on(async {
        spawn_relay(Arc::clone(&harness.store), harness.broadcaster.clone())
    });

    runtime.block_on(async {
        // Step 1 (agent/MCP): create a chart; the editor sees version 1.
        let Json(created) = server
            .create_flowchart(Parameters(CreateFlowchartParams {
                name: "Release Plan".to_owned(),
                description: None,
            }))
            .await
            .expect("create_flowchart");
        assert_eq!(created.id, "release-plan");

        let frame = next_frame(&mut frames).await;
        assert_eq!(frame["type"], "flowchart_update");
        assert_eq!(frame["id"], "release-plan");
        assert_eq!(frame["data"]["version"], 1);
        assert_eq!(frame["data"]["name"], "Release Plan");

        // Step 2 (agent/MCP): build out the chart; one frame per mutation,
        // versions strictly in order.
        let Json(start) = server
            .add_node(Parameters(AddNodeParams {
                flowchart_id: created.id.clone(),
                node_type: "start".to_owned(),
                label: "Kickoff".to_owned(),
                description: None,
                position: None,
                parent_group: None,
                metadata: None,
            }))
            .await
            .expect("add_node start");
        let Json(task) = server
            .add_node(Parameters(AddNodeParams {
                flowchart_id: created.id.clone(),
                node_type: "task".to_owned(),
                label: "Ship".to_owned(),
                description: None,
                position: None,
                parent_group: None,
                metadata: None,
            }))
            .await
            .expect("add_node task");
        server
            .add_edge(Parameters(AddEdgeParams {
                flowchart_id: created.id.clone(),
                source: start.node_id.clone(),
                target: task.node_id.clone(),
                label: None,
                edge_type: None,
                animated: None,
            }))
            .await
            .expect("add_edge");

        let frame = next_frame(&mut frames).await;
        assert_eq!(frame["data"]["version"], 2);
        assert_eq!(frame["data"]["nodes"].as_array().map(Vec::len), Some(1));
        let frame = next_frame(&mut frames).await;
        assert_eq!(frame["data"]["version"], 3);
        let frame = next_frame(&mut frames).await;
        assert_eq!(frame["data"]["version"], 4);
        assert_eq!(frame["data"]["edges"].as_array().map(Vec::len), Some(1));

        // Step 3 (agent/MCP): auto-layout lands as one more update.
        let Json(laid) = server
            .auto_layout(Parameters(AutoLayoutParams {
                flowchart_id: created.id.clone(),
                direction: None,
                algorithm: None,
            }))
            .await
            .expect("auto_layout");
        assert_eq!(laid.nodes_positioned, 2);

        let frame = next_frame(&mut frames).await;
        assert_eq!(frame["data"]["version"], 5);

        // Step 4 (editor/REST): a fresh process reading the same directory
        // sees exactly the state the last frame announced.
        let reader = harness.second_store();
        let doc = reader
            .read(&FlowchartId::new(created.id.as_str()).expect("flowchart id"))
            .expect("read")
            .expect("document on disk");
        assert_eq!(doc.version(), 5);
        assert_eq!(doc.name(), "Release Plan");
        assert_eq!(doc.nodes().len(), 2);
        assert_eq!(doc.edges().len(), 1);
    });

    // Step 5 (shutdown): once every store handle is gone the relay drains
    // and exits on its own.
    let EditorHarness { tmp, store, broadcaster } = harness;
    drop(server);
    drop(store);
    drop(broadcaster);
    runtime.block_on(async {
        tokio::time::timeout(Duration::from_secs(2), relay)
            .await
            .expect("relay exits after the store is dropped")
            .expect("relay task completes");
    });
    drop(tmp);
}

#[test]
fn e2e_external_edits_flow_through_the_watcher_to_subscribers() {
    let runtime = new_runtime();
    let harness = EditorHarness::new("watcher-stream");
    let server = harness.server();

    let mut frames = harness.frames();
    let watcher = runtime.block_on(async {
        // The relay runs detached here; only the watcher's exit is asserted.
        let _relay = spawn_relay(Arc::clone(&harness.store), harness.broadcaster.clone());
        spawn_watcher(Arc::clone(&harness.store))
    });

    runtime.block_on(async {
        // Step 1 (agent/MCP): create and populate; these frames come straight
        // from the store, not the watcher.
        let Json(created) = server
            .create_flowchart(Parameters(CreateFlowchartParams {
                name: "Shared Plan".to_owned(),
                description: None,
            }))
            .await
            .expect("create_flowchart");
        let frame = next_frame(&mut frames).await;
        assert_eq!(frame["data"]["version"], 1);

        // Give the watcher a couple of ticks to fold the new file into its
        // baseline before something else touches it.
        tokio::time::sleep(Duration::from_millis(150)).await;

        // Step 2 (other process): rename the chart through a second store on
        // the same directory.
        let other = harness.second_store();
        let id = FlowchartId::new(created.id.as_str()).expect("flowchart id");
        other
            .update(
                &id,
                DocumentPatch {
                    name: Some("Renamed Plan".to_owned()),
                    ..DocumentPatch::default()
                },
            )
            .await
            .expect("external update");

        // Step 3 (editor): the watcher attributes the file change to the
        // other process and pushes the fresh document.
        let frame = next_frame(&mut frames).await;
        assert_eq!(frame["type"], "flowchart_update");
        assert_eq!(frame["id"], created.id);
        assert_eq!(frame["data"]["version"], 2);
        assert_eq!(frame["data"]["name"], "Renamed Plan");

        // Step 4 (agent/MCP): the first server reads through to the same
        // state the watcher announced.
        let Json(doc) = server
            .read_flowchart(Parameters(ReadFlowchartParams {
                flowchart_id: created.id.clone(),
            }))
            .await
            .expect("read_flowchart");
        assert_eq!(doc.version(), 2);
        assert_eq!(doc.name(), "Renamed Plan");
    });

    harness.store.close();
    runtime.block_on(async {
        tokio::time::timeout(Duration::from_secs(2), watcher)
            .await
            .expect("watcher exits after close")
            .expect("watcher task completes");
    });
}

#[test]
fn e2e_two_servers_share_one_project_directory() {
    let runtime = new_runtime();
    let harness = EditorHarness::new("two-servers");

    let server_a = harness.server();
    let server_b = FlowplanMcp::new(harness.second_store(), E2E_PORT + 1);

    runtime.block_on(async {
        // Step 1 (agent A): create the chart and a first node.
        let Json(created) = server_a
            .create_flowchart(Parameters(CreateFlowchartParams {
                name: "Handoff".to_owned(),
                description: None,
            }))
            .await
            .expect("create_flowchart");
        let Json(first) = server_a
            .add_node(Parameters(AddNodeParams {
                flowchart_id: created.id.clone(),
                node_type: "task".to_owned(),
                label: "Agent A step".to_owned(),
                description: None,
                position: None,
                parent_group: None,
                metadata: None,
            }))
            .await
            .expect("add_node via A");

        // Step 2 (agent B): a separate process picks the chart up from disk
        // and keeps editing it.
        let Json(seen_by_b) = server_b
            .read_flowchart(Parameters(ReadFlowchartParams {
                flowchart_id: created.id.clone(),
            }))
            .await
            .expect("read_flowchart via B");
        assert_eq!(seen_by_b.version(), 2);
        assert_eq!(seen_by_b.nodes().len(), 1);

        let Json(second) = server_b
            .add_node(Parameters(AddNodeParams {
                flowchart_id: created.id.clone(),
                node_type: "task".to_owned(),
                label: "Agent B step".to_owned(),
                description: None,
                position: None,
                parent_group: None,
                metadata: None,
            }))
            .await
            .expect("add_node via B");
        server_b
            .update_node(Parameters(UpdateNodeParams {
                flowchart_id: created.id.clone(),
                node_id: first.node_id.clone(),
                label: None,
                description: None,
                status: Some("completed".to_owned()),
                metadata: None,
            }))
            .await
            .expect("update_node via B");

        // Step 3 (agent A): every interleaved edit read back through the
        // first server, nothing lost.
        let Json(merged) = server_a
            .read_flowchart(Parameters(ReadFlowchartParams {
                flowchart_id: created.id.clone(),
            }))
            .await
            .expect("read_flowchart via A");
        assert_eq!(merged.version(), 4);
        assert_eq!(merged.nodes().len(), 2);

        let first_node = merged
            .node(&NodeId::new(first.node_id.as_str()).expect("node id"))
            .expect("first node");
        assert_eq!(first_node.data().status(), NodeStatus::Completed);
        let second_node = merged
            .node(&NodeId::new(second.node_id.as_str()).expect("node id"))
            .expect("second node");
        assert_eq!(second_node.data().label(), "Agent B step");
    });
}
