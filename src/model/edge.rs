// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ids::{EdgeId, NodeId};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    #[default]
    Default,
    Success,
    Failure,
    Conditional,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Conditional => "conditional",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEdgeKindError {
    pub value: String,
}

impl fmt::Display for ParseEdgeKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown edge type: {:?}", self.value)
    }
}

impl std::error::Error for ParseEdgeKindError {}

impl FromStr for EdgeKind {
    type Err = ParseEdgeKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "conditional" => Ok(Self::Conditional),
            other => Err(ParseEdgeKindError {
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EdgeData {
    #[serde(default)]
    label: String,
    #[serde(default)]
    animated: bool,
}

impl EdgeData {
    pub fn new(label: impl Into<String>, animated: bool) -> Self {
        Self {
            label: label.into(),
            animated,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn animated(&self) -> bool {
        self.animated
    }

    pub fn set_animated(&mut self, animated: bool) {
        self.animated = animated;
    }
}

/// A directed connection between two node ids. Endpoints are not required to
/// currently exist; dangling edges are tolerated and simply excluded from
/// layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FlowEdge {
    id: EdgeId,
    source: NodeId,
    target: NodeId,
    #[serde(rename = "type", default)]
    kind: EdgeKind,
    #[serde(default)]
    data: EdgeData,
}

impl FlowEdge {
    pub fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            kind: EdgeKind::default(),
            data: EdgeData::default(),
        }
    }

    pub fn id(&self) -> &EdgeId {
        &self.id
    }

    pub fn source(&self) -> &NodeId {
        &self.source
    }

    pub fn target(&self) -> &NodeId {
        &self.target
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: EdgeKind) {
        self.kind = kind;
    }

    pub fn data(&self) -> &EdgeData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut EdgeData {
        &mut self.data
    }

    /// True when either endpoint references `node_id`.
    pub fn touches(&self, node_id: &NodeId) -> bool {
        &self.source == node_id || &self.target == node_id
    }
}
