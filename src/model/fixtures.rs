// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::document::FlowchartDocument;
use super::edge::{EdgeKind, FlowEdge};
use super::ids::{EdgeId, FlowchartId, NodeId};
use super::node::{FlowNode, NodeKind, Position};

pub(crate) fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

pub(crate) fn eid(value: &str) -> EdgeId {
    EdgeId::new(value).expect("edge id")
}

pub(crate) fn node(id: &str, kind: NodeKind, label: &str) -> FlowNode {
    let mut node = FlowNode::new(nid(id), kind);
    node.data_mut().set_label(label);
    node
}

pub(crate) fn edge(id: &str, source: &str, target: &str) -> FlowEdge {
    FlowEdge::new(eid(id), nid(source), nid(target))
}

pub(crate) fn typed_edge(id: &str, source: &str, target: &str, kind: EdgeKind) -> FlowEdge {
    let mut edge = edge(id, source, target);
    edge.set_kind(kind);
    edge
}

pub(crate) fn empty_document(id: &str) -> FlowchartDocument {
    FlowchartDocument::new(FlowchartId::new(id).expect("flowchart id"), id, "")
}

/// `start -> task -> end` chain, the smallest interesting layout input.
pub(crate) fn linear_chain() -> FlowchartDocument {
    let mut doc = empty_document("chain");
    doc.nodes_mut().push(node("start", NodeKind::Start, "Start"));
    doc.nodes_mut().push(node("task", NodeKind::Task, "Work"));
    doc.nodes_mut().push(node("end", NodeKind::End, "End"));
    doc.edges_mut().push(edge("e1", "start", "task"));
    doc.edges_mut().push(edge("e2", "task", "end"));
    doc
}

/// `decision --success--> task --failure--> decision` retry loop.
pub(crate) fn retry_cycle() -> FlowchartDocument {
    let mut doc = empty_document("retry");
    doc.nodes_mut().push(node("decision", NodeKind::Decision, "Check"));
    doc.nodes_mut().push(node("task", NodeKind::Task, "Retry"));
    doc.edges_mut().push(typed_edge("e1", "decision", "task", EdgeKind::Success));
    doc.edges_mut().push(typed_edge("e2", "task", "decision", EdgeKind::Failure));
    doc
}

/// A `phase_group` containing two chained children, plus a top-level tail.
pub(crate) fn grouped_phase() -> FlowchartDocument {
    let mut doc = empty_document("grouped");
    doc.nodes_mut().push(node("group1", NodeKind::PhaseGroup, "Phase 1"));

    let mut t1 = node("t1", NodeKind::Task, "First");
    t1.set_parent_node(Some(nid("group1")));
    let mut t2 = node("t2", NodeKind::Task, "Second");
    t2.set_parent_node(Some(nid("group1")));
    doc.nodes_mut().push(t1);
    doc.nodes_mut().push(t2);

    doc.nodes_mut().push(node("done", NodeKind::End, "Done"));
    doc.edges_mut().push(edge("e1", "t1", "t2"));
    doc.edges_mut().push(edge("e2", "t2", "done"));
    doc
}

/// Chain with a free-floating annotation note pinned at a fixed position.
pub(crate) fn chain_with_annotation() -> FlowchartDocument {
    let mut doc = linear_chain();
    let mut note = node("annotation_note-1", NodeKind::AnnotationNote, "remember");
    note.set_position(Position::new(400.0, 15.0));
    doc.nodes_mut().push(note);
    doc
}
