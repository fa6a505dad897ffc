// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use flowplan::model::{
    EdgeId, EdgeKind, FlowEdge, FlowNode, FlowchartDocument, FlowchartId, NodeId, NodeKind,
};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new(prefix: &str) -> Self {
        let pid = std::process::id();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut path = std::env::temp_dir();
        path.push(format!("flowplan_bench_{prefix}_{pid}_{nanos}_{counter}"));
        std::fs::create_dir_all(&path).expect("create temp dir");

        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

pub fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

pub fn eid(value: &str) -> EdgeId {
    EdgeId::new(value).expect("edge id")
}

fn empty(id: &str) -> FlowchartDocument {
    FlowchartDocument::new(FlowchartId::new(id).expect("flowchart id"), id, "")
}

fn task(id: &str, label: &str) -> FlowNode {
    let mut node = FlowNode::new(nid(id), NodeKind::Task);
    node.data_mut().set_label(label);
    node
}

/// `start -> task-0 -> ... -> task-(n-1) -> end`.
pub fn chain(node_count: usize) -> FlowchartDocument {
    let mut doc = empty("bench-chain");
    doc.nodes_mut().push(task("n-0", "start"));
    for i in 1..node_count {
        doc.nodes_mut().push(task(&format!("n-{i}"), "step"));
        doc.edges_mut().push(FlowEdge::new(
            eid(&format!("e-{i}")),
            nid(&format!("n-{}", i - 1)),
            nid(&format!("n-{i}")),
        ));
    }
    doc
}

/// `group_count` phase groups of `members_per_group` chained tasks each,
/// with the groups themselves chained start to finish.
pub fn grouped(group_count: usize, members_per_group: usize) -> FlowchartDocument {
    let mut doc = empty("bench-grouped");
    for g in 0..group_count {
        let group_id = format!("g-{g}");
        let mut group = FlowNode::new(nid(&group_id), NodeKind::PhaseGroup);
        group.data_mut().set_label(format!("phase {g}"));
        doc.nodes_mut().push(group);

        for m in 0..members_per_group {
            let member_id = format!("g-{g}-m-{m}");
            let mut member = task(&member_id, "member");
            member.set_parent_node(Some(nid(&group_id)));
            doc.nodes_mut().push(member);
            if m > 0 {
                doc.edges_mut().push(FlowEdge::new(
                    eid(&format!("e-{g}-{m}")),
                    nid(&format!("g-{g}-m-{}", m - 1)),
                    nid(&member_id),
                ));
            }
        }

        if g > 0 {
            // Cross-group edge from the previous group's last member.
            doc.edges_mut().push(FlowEdge::new(
                eid(&format!("x-{g}")),
                nid(&format!("g-{}-m-{}", g - 1, members_per_group - 1)),
                nid(&format!("g-{g}-m-0")),
            ));
        }
    }
    doc
}

/// A chain where every fourth node loops back via a `failure` edge and every
/// seventh via a `conditional` edge, so layering has to break real cycles.
pub fn cyclic(node_count: usize) -> FlowchartDocument {
    let mut doc = chain(node_count);
    for i in (4..node_count).step_by(4) {
        let mut edge = FlowEdge::new(
            eid(&format!("fail-{i}")),
            nid(&format!("n-{i}")),
            nid(&format!("n-{}", i - 3)),
        );
        edge.set_kind(EdgeKind::Failure);
        doc.edges_mut().push(edge);
    }
    for i in (7..node_count).step_by(7) {
        let mut edge = FlowEdge::new(
            eid(&format!("cond-{i}")),
            nid(&format!("n-{i}")),
            nid(&format!("n-{}", i - 5)),
        );
        edge.set_kind(EdgeKind::Conditional);
        doc.edges_mut().push(edge);
    }
    doc
}
