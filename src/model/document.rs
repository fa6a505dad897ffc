// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use chrono::{SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::annotations::AnnotationLayer;
use super::edge::FlowEdge;
use super::ids::{EdgeId, FlowchartId, NodeId};
use super::node::FlowNode;

/// Current wall-clock time in the wire timestamp format (RFC 3339,
/// millisecond precision, `Z` suffix).
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Pan/zoom state of the visual editor, persisted with the document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// The root aggregate: one flowchart's complete persisted state.
///
/// `version` starts at 1 and increases by exactly 1 on every mutation; no two
/// persisted revisions of the same document share a version. Timestamps are
/// kept as opaque wire strings so externally written files round-trip
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowchartDocument {
    id: FlowchartId,
    name: String,
    #[serde(default)]
    description: String,
    version: u64,
    created_at: String,
    updated_at: String,
    #[serde(default)]
    viewport: Viewport,
    #[serde(default)]
    engineering_mode: bool,
    #[serde(default)]
    nodes: Vec<FlowNode>,
    #[serde(default)]
    edges: Vec<FlowEdge>,
    #[serde(default)]
    annotations: AnnotationLayer,
}

impl FlowchartDocument {
    pub fn new(id: FlowchartId, name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = now_timestamp();
        Self {
            id,
            name: name.into(),
            description: description.into(),
            version: 1,
            created_at: now.clone(),
            updated_at: now,
            viewport: Viewport::default(),
            engineering_mode: false,
            nodes: Vec::new(),
            edges: Vec::new(),
            annotations: AnnotationLayer::default(),
        }
    }

    pub fn id(&self) -> &FlowchartId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn updated_at(&self) -> &str {
        &self.updated_at
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn engineering_mode(&self) -> bool {
        self.engineering_mode
    }

    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut Vec<FlowNode> {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[FlowEdge] {
        &self.edges
    }

    pub fn edges_mut(&mut self) -> &mut Vec<FlowEdge> {
        &mut self.edges
    }

    pub fn annotations(&self) -> &AnnotationLayer {
        &self.annotations
    }

    pub fn annotations_mut(&mut self) -> &mut AnnotationLayer {
        &mut self.annotations
    }

    pub fn node(&self, node_id: &NodeId) -> Option<&FlowNode> {
        self.nodes.iter().find(|node| node.id() == node_id)
    }

    pub fn node_mut(&mut self, node_id: &NodeId) -> Option<&mut FlowNode> {
        self.nodes.iter_mut().find(|node| node.id() == node_id)
    }

    pub fn has_node(&self, node_id: &NodeId) -> bool {
        self.node(node_id).is_some()
    }

    /// Removes a node and every edge referencing it as source or target.
    /// Returns false (and leaves the document untouched) if the node does not
    /// exist.
    pub fn remove_node(&mut self, node_id: &NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|node| node.id() != node_id);
        if self.nodes.len() == before {
            return false;
        }
        self.edges.retain(|edge| !edge.touches(node_id));
        true
    }

    pub fn remove_edge(&mut self, edge_id: &EdgeId) -> bool {
        let before = self.edges.len();
        self.edges.retain(|edge| edge.id() != edge_id);
        self.edges.len() != before
    }

    /// Applies one mutation's bookkeeping: version +1, `updatedAt` restamped.
    pub fn bump_version(&mut self) {
        self.version += 1;
        self.updated_at = now_timestamp();
    }

    /// Shallow-merges the patch over this document. The stored id, version,
    /// and `updatedAt` are never taken from a patch; callers follow up with
    /// [`bump_version`](Self::bump_version).
    pub fn apply_patch(&mut self, patch: DocumentPatch) {
        let DocumentPatch {
            name,
            description,
            created_at,
            viewport,
            engineering_mode,
            nodes,
            edges,
            annotations,
        } = patch;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(created_at) = created_at {
            self.created_at = created_at;
        }
        if let Some(viewport) = viewport {
            self.viewport = viewport;
        }
        if let Some(engineering_mode) = engineering_mode {
            self.engineering_mode = engineering_mode;
        }
        if let Some(nodes) = nodes {
            self.nodes = nodes;
        }
        if let Some(edges) = edges {
            self.edges = edges;
        }
        if let Some(annotations) = annotations {
            self.annotations = annotations;
        }
    }

    pub fn summary(&self) -> FlowchartSummary {
        FlowchartSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

/// Partial document for shallow-merge updates. Absent fields keep their
/// stored values; `id`/`version`/`updatedAt` in an incoming payload are
/// ignored by construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engineering_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<FlowNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<FlowEdge>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<AnnotationLayer>,
}

/// Listing entry: the fields clients need to enumerate documents without
/// decoding every node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowchartSummary {
    pub id: FlowchartId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub updated_at: String,
}
