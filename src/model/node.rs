// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::NodeId;

/// Closed set of node types.
///
/// Structural types shape the plan itself, domain-annotation types tag
/// engineering artifacts, and the `annotation_*` types are presentation-only
/// overlay elements that never participate in layout.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Start,
    End,
    Task,
    Decision,
    Note,
    Milestone,
    PhaseGroup,
    ParallelFork,
    FileRef,
    ApiEndpoint,
    DbEntity,
    TestCheckpoint,
    McpTool,
    HumanAction,
    AnnotationNote,
    AnnotationText,
}

impl NodeKind {
    pub const ALL: [NodeKind; 16] = [
        NodeKind::Start,
        NodeKind::End,
        NodeKind::Task,
        NodeKind::Decision,
        NodeKind::Note,
        NodeKind::Milestone,
        NodeKind::PhaseGroup,
        NodeKind::ParallelFork,
        NodeKind::FileRef,
        NodeKind::ApiEndpoint,
        NodeKind::DbEntity,
        NodeKind::TestCheckpoint,
        NodeKind::McpTool,
        NodeKind::HumanAction,
        NodeKind::AnnotationNote,
        NodeKind::AnnotationText,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Task => "task",
            Self::Decision => "decision",
            Self::Note => "note",
            Self::Milestone => "milestone",
            Self::PhaseGroup => "phase_group",
            Self::ParallelFork => "parallel_fork",
            Self::FileRef => "file_ref",
            Self::ApiEndpoint => "api_endpoint",
            Self::DbEntity => "db_entity",
            Self::TestCheckpoint => "test_checkpoint",
            Self::McpTool => "mcp_tool",
            Self::HumanAction => "human_action",
            Self::AnnotationNote => "annotation_note",
            Self::AnnotationText => "annotation_text",
        }
    }

    /// Presentation-only overlay types, excluded from layout entirely.
    pub fn is_annotation(&self) -> bool {
        matches!(self, Self::AnnotationNote | Self::AnnotationText)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNodeKindError {
    pub value: String,
}

impl fmt::Display for ParseNodeKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown node type: {:?}", self.value)
    }
}

impl std::error::Error for ParseNodeKindError {}

impl FromStr for NodeKind {
    type Err = ParseNodeKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| ParseNodeKindError {
                value: s.to_owned(),
            })
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Blocked => "blocked",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNodeStatusError {
    pub value: String,
}

impl fmt::Display for ParseNodeStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown node status: {:?}", self.value)
    }
}

impl std::error::Error for ParseNodeStatusError {}

impl FromStr for NodeStatus {
    type Err = ParseNodeStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "blocked" => Ok(Self::Blocked),
            other => Err(ParseNodeStatusError {
                value: other.to_owned(),
            }),
        }
    }
}

/// A 2-D point. Absolute for top-level nodes, parent-relative for nodes
/// inside a `phase_group`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Position {
    x: f64,
    y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }
}

/// Per-node payload. `metadata` and `style` are opaque pass-through maps;
/// different node types attach different ad hoc keys and the core only ever
/// merges them, never interprets them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeData {
    #[serde(default)]
    label: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    status: NodeStatus,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    style: BTreeMap<String, Value>,
}

impl NodeData {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn set_status(&mut self, status: NodeStatus) {
        self.status = status;
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.metadata
    }

    pub fn style(&self) -> &BTreeMap<String, Value> {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.style
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowNode {
    id: NodeId,
    #[serde(rename = "type")]
    kind: NodeKind,
    position: Position,
    #[serde(default)]
    parent_node: Option<NodeId>,
    #[serde(default)]
    data: NodeData,
}

impl FlowNode {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            position: Position::default(),
            parent_node: None,
            data: NodeData::default(),
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn parent_node(&self) -> Option<&NodeId> {
        self.parent_node.as_ref()
    }

    pub fn set_parent_node(&mut self, parent_node: Option<NodeId>) {
        self.parent_node = parent_node;
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut NodeData {
        &mut self.data
    }
}
