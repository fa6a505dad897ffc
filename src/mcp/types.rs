// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Position;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateFlowchartParams {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateFlowchartResponse {
    pub id: String,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddNodeParams {
    pub flowchart_id: String,
    /// Node type, e.g. `task`, `decision`, `phase_group`, `start`, `end`.
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: String,
    pub description: Option<String>,
    /// Absolute position; defaults to the origin offset when omitted.
    pub position: Option<Position>,
    /// Id of an existing `phase_group` node this node belongs to.
    pub parent_group: Option<String>,
    /// Free-form metadata. A `status` key whose value is a valid status
    /// string is lifted into the node status and removed from the map.
    pub metadata: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddNodeResponse {
    pub node_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddEdgeParams {
    pub flowchart_id: String,
    pub source: String,
    pub target: String,
    pub label: Option<String>,
    /// Edge type: `default`, `success`, `failure`, or `conditional`.
    #[serde(rename = "type")]
    pub edge_type: Option<String>,
    pub animated: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddEdgeResponse {
    pub edge_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateNodeParams {
    pub flowchart_id: String,
    pub node_id: String,
    pub label: Option<String>,
    pub description: Option<String>,
    /// One of `pending`, `in_progress`, `completed`, `blocked`.
    pub status: Option<String>,
    /// Metadata to merge key-wise into the node's existing metadata.
    pub metadata: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RemoveNodeParams {
    pub flowchart_id: String,
    pub node_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RemoveEdgeParams {
    pub flowchart_id: String,
    pub edge_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AckResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReadFlowchartParams {
    pub flowchart_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct OpenFlowchartParams {
    pub flowchart_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OpenFlowchartResponse {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AutoLayoutParams {
    pub flowchart_id: String,
    /// Layout direction: `TB` (top-bottom, default) or `LR` (left-right).
    pub direction: Option<String>,
    /// Accepted for compatibility; the layered algorithm is always used.
    pub algorithm: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AutoLayoutResponse {
    pub success: bool,
    pub nodes_positioned: u64,
    pub direction: String,
}
