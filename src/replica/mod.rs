// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! An editor's local copy of one document.
//!
//! The replica applies mutations optimistically and keeps bounded undo/redo
//! history. Saving is debounced: each edit arms (or re-arms) a [`SaveScheduler`]
//! deadline, and once it fires the caller serializes the replica via
//! [`FlowchartReplica::to_document`], writes it back, and calls
//! [`FlowchartReplica::mark_saved`]. Authoritative pushes come in through
//! [`FlowchartReplica::from_document`] and always replace local state,
//! including an unsaved dirty edit (accepted last-writer-wins race).

pub mod save;

pub use save::{SaveScheduler, SAVE_DEBOUNCE};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::model::{
    AnnotationArrow, AnnotationLayer, AnnotationStroke, DocumentPatch, EdgeId, EdgeKind, FlowEdge,
    FlowNode, FlowchartDocument, FlowchartId, NodeId, NodeStatus, Position,
};

/// Most recent snapshots kept on the undo stack; the oldest entry is dropped
/// silently beyond this.
const HISTORY_LIMIT: usize = 50;

/// The state captured per undo step. Identity fields (id, name, description)
/// are not part of history; undo never renames a document.
#[derive(Debug, Clone, PartialEq)]
struct HistorySnapshot {
    nodes: Vec<FlowNode>,
    edges: Vec<FlowEdge>,
    strokes: Vec<AnnotationStroke>,
    arrows: Vec<AnnotationArrow>,
}

/// Field replacements for one node's data. Unlike the store's merge-based
/// node update, a present `metadata`/`style` here replaces the whole map;
/// the editor always writes complete values.
#[derive(Debug, Clone, Default)]
pub struct NodeDataPatch {
    pub label: Option<String>,
    pub description: Option<String>,
    pub status: Option<NodeStatus>,
    pub metadata: Option<BTreeMap<String, Value>>,
    pub style: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Default)]
pub struct EdgeDataPatch {
    pub kind: Option<EdgeKind>,
    pub label: Option<String>,
    pub animated: Option<bool>,
}

/// Local editable copy of one flowchart.
///
/// Every structural mutation snapshots `{nodes, edges, strokes, arrows}` onto
/// the undo stack, clears the redo stack, applies, and marks the replica
/// dirty. The snapshot is taken before the target is looked up, so a mutation
/// whose target turns out to be missing still costs one history entry.
#[derive(Debug, Clone, Default)]
pub struct FlowchartReplica {
    id: Option<FlowchartId>,
    name: String,
    description: String,
    engineering_mode: bool,
    nodes: Vec<FlowNode>,
    edges: Vec<FlowEdge>,
    strokes: Vec<AnnotationStroke>,
    arrows: Vec<AnnotationArrow>,
    past: Vec<HistorySnapshot>,
    future: Vec<HistorySnapshot>,
    dirty: bool,
    last_saved_at: Option<DateTime<Utc>>,
}

impl FlowchartReplica {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<&FlowchartId> {
        self.id.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[FlowEdge] {
        &self.edges
    }

    pub fn strokes(&self) -> &[AnnotationStroke] {
        &self.strokes
    }

    pub fn arrows(&self) -> &[AnnotationArrow] {
        &self.arrows
    }

    pub fn node(&self, node_id: &NodeId) -> Option<&FlowNode> {
        self.nodes.iter().find(|node| node.id() == node_id)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn add_node(&mut self, node: FlowNode) {
        self.begin_mutation();
        self.nodes.push(node);
    }

    /// Removes the node and every edge touching it. Returns whether the node
    /// existed.
    pub fn remove_node(&mut self, node_id: &NodeId) -> bool {
        self.begin_mutation();
        let before = self.nodes.len();
        self.nodes.retain(|node| node.id() != node_id);
        if self.nodes.len() == before {
            return false;
        }
        self.edges.retain(|edge| !edge.touches(node_id));
        true
    }

    /// Adds a default-typed edge between two nodes, the way a drag-connect
    /// gesture does: empty label, not animated.
    pub fn connect(&mut self, id: EdgeId, source: NodeId, target: NodeId) -> EdgeId {
        self.begin_mutation();
        self.edges.push(FlowEdge::new(id.clone(), source, target));
        id
    }

    pub fn remove_edge(&mut self, edge_id: &EdgeId) -> bool {
        self.begin_mutation();
        let before = self.edges.len();
        self.edges.retain(|edge| edge.id() != edge_id);
        self.edges.len() != before
    }

    pub fn update_node_data(&mut self, node_id: &NodeId, patch: NodeDataPatch) -> bool {
        self.begin_mutation();
        let Some(node) = self.nodes.iter_mut().find(|node| node.id() == node_id) else {
            return false;
        };
        let data = node.data_mut();
        if let Some(label) = patch.label {
            data.set_label(label);
        }
        if let Some(description) = patch.description {
            data.set_description(description);
        }
        if let Some(status) = patch.status {
            data.set_status(status);
        }
        if let Some(metadata) = patch.metadata {
            *data.metadata_mut() = metadata;
        }
        if let Some(style) = patch.style {
            *data.style_mut() = style;
        }
        true
    }

    pub fn update_edge_data(&mut self, edge_id: &EdgeId, patch: EdgeDataPatch) -> bool {
        self.begin_mutation();
        let Some(edge) = self.edges.iter_mut().find(|edge| edge.id() == edge_id) else {
            return false;
        };
        if let Some(kind) = patch.kind {
            edge.set_kind(kind);
        }
        let data = edge.data_mut();
        if let Some(label) = patch.label {
            data.set_label(label);
        }
        if let Some(animated) = patch.animated {
            data.set_animated(animated);
        }
        true
    }

    /// Re-parents a node, converting its position between absolute and
    /// parent-relative coordinates so it stays visually fixed. A dangling
    /// parent reference contributes no offset.
    pub fn move_node(&mut self, node_id: &NodeId, new_parent: Option<&NodeId>) -> bool {
        self.begin_mutation();

        let Some(index) = self.nodes.iter().position(|node| node.id() == node_id) else {
            return false;
        };

        let old_offset = self.nodes[index]
            .parent_node()
            .and_then(|parent| self.node_position(parent))
            .unwrap_or_default();
        let new_offset = new_parent
            .and_then(|parent| self.node_position(parent))
            .unwrap_or_default();

        let node = &mut self.nodes[index];
        let position = node.position();
        node.set_position(Position::new(
            position.x() + old_offset.x() - new_offset.x(),
            position.y() + old_offset.y() - new_offset.y(),
        ));
        node.set_parent_node(new_parent.cloned());
        true
    }

    pub fn add_stroke(&mut self, stroke: AnnotationStroke) {
        self.begin_mutation();
        self.strokes.push(stroke);
    }

    pub fn remove_stroke(&mut self, stroke_id: &str) -> bool {
        self.begin_mutation();
        let before = self.strokes.len();
        self.strokes.retain(|stroke| stroke.id() != stroke_id);
        self.strokes.len() != before
    }

    pub fn add_arrow(&mut self, arrow: AnnotationArrow) {
        self.begin_mutation();
        self.arrows.push(arrow);
    }

    pub fn remove_arrow(&mut self, arrow_id: &str) -> bool {
        self.begin_mutation();
        let before = self.arrows.len();
        self.arrows.retain(|arrow| arrow.id() != arrow_id);
        self.arrows.len() != before
    }

    /// Restores the previous snapshot. Restoring prior state is itself a
    /// change needing persistence, so the replica stays dirty. Returns false
    /// on an empty undo stack.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.future.push(current);
        self.restore(previous);
        self.dirty = true;
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.past.push(current);
        self.restore(next);
        self.dirty = true;
        true
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
        self.last_saved_at = Some(Utc::now());
    }

    /// Serializes local state to the wire format with version 1 and fresh
    /// timestamps; the store assigns the real version when this is applied as
    /// an update. Returns `None` until the replica has been bound to a
    /// document id via [`from_document`](Self::from_document).
    pub fn to_document(&self) -> Option<FlowchartDocument> {
        let id = self.id.clone()?;
        let mut doc = FlowchartDocument::new(id, self.name.clone(), self.description.clone());
        doc.apply_patch(DocumentPatch {
            engineering_mode: Some(self.engineering_mode),
            nodes: Some(self.nodes.clone()),
            edges: Some(self.edges.clone()),
            annotations: Some(AnnotationLayer::new(
                self.strokes.clone(),
                self.arrows.clone(),
            )),
            ..DocumentPatch::default()
        });
        Some(doc)
    }

    /// Replaces all local state with an authoritative document, clearing
    /// history and the dirty flag. Callers apply every push for the open
    /// document id through here unconditionally.
    pub fn from_document(&mut self, mut doc: FlowchartDocument) {
        self.id = Some(doc.id().clone());
        self.name = doc.name().to_owned();
        self.description = doc.description().to_owned();
        self.engineering_mode = doc.engineering_mode();
        self.nodes = std::mem::take(doc.nodes_mut());
        self.edges = std::mem::take(doc.edges_mut());
        self.strokes = std::mem::take(doc.annotations_mut().strokes_mut());
        self.arrows = std::mem::take(doc.annotations_mut().arrows_mut());

        self.past.clear();
        self.future.clear();
        self.dirty = false;
    }

    fn node_position(&self, node_id: &NodeId) -> Option<Position> {
        self.node(node_id).map(|node| node.position())
    }

    fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            strokes: self.strokes.clone(),
            arrows: self.arrows.clone(),
        }
    }

    fn restore(&mut self, snapshot: HistorySnapshot) {
        self.nodes = snapshot.nodes;
        self.edges = snapshot.edges;
        self.strokes = snapshot.strokes;
        self.arrows = snapshot.arrows;
    }

    /// Common entry for every structural mutation: snapshot onto the undo
    /// stack (dropping the oldest beyond the cap), clear redo, mark dirty.
    fn begin_mutation(&mut self) {
        if self.past.len() == HISTORY_LIMIT {
            self.past.remove(0);
        }
        self.past.push(self.snapshot());
        self.future.clear();
        self.dirty = true;
    }
}
