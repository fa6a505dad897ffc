// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler};
use serde_json::Value;

use crate::layout::LayoutDirection;
use crate::model::{EdgeId, EdgeKind, FlowchartDocument, FlowchartId, NodeId, NodeKind, NodeStatus};
use crate::store::{EdgeSpec, FlowchartStore, NodeSpec, NodeUpdate, StoreError};

use super::types::*;

const METADATA_STATUS_KEY: &str = "status";

#[derive(Clone)]
pub struct FlowplanMcp {
    store: Arc<FlowchartStore>,
    port: u16,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl FlowplanMcp {
    /// `port` is the HTTP port the web editor is reachable on; it only feeds
    /// the URLs handed back by `open_flowchart`.
    pub fn new(store: Arc<FlowchartStore>, port: u16) -> Self {
        Self {
            store,
            port,
            tool_router: Self::tool_router(),
        }
    }

    /// Create a new flowchart document; returns its id and on-disk path.
    #[tool(name = "create_flowchart")]
    async fn create_flowchart(
        &self,
        params: Parameters<CreateFlowchartParams>,
    ) -> Result<Json<CreateFlowchartResponse>, ErrorData> {
        let CreateFlowchartParams { name, description } = params.0;

        let id = self
            .store
            .create(&name, description.as_deref().unwrap_or_default(), None, None)
            .await
            .map_err(map_store_error)?;

        let path = self.store.dir().document_path(&id);
        Ok(Json(CreateFlowchartResponse {
            id: id.into_string(),
            path: path.display().to_string(),
        }))
    }

    /// Add a node to a flowchart; pair with `add_edge` to wire it into the flow.
    #[tool(name = "add_node")]
    async fn add_node(
        &self,
        params: Parameters<AddNodeParams>,
    ) -> Result<Json<AddNodeResponse>, ErrorData> {
        let AddNodeParams {
            flowchart_id,
            node_type,
            label,
            description,
            position,
            parent_group,
            metadata,
        } = params.0;

        let id = parse_flowchart_id(&flowchart_id)?;
        let kind = parse_node_kind(&node_type)?;
        let parent_node = parent_group
            .as_deref()
            .map(|value| parse_node_id("parent_group", value))
            .transpose()?;

        // Agents habitually tuck the status into metadata; lift it out so it
        // lands on the node instead of being stored twice. An unrecognized
        // value falls back to pending, and the key never survives either way.
        let mut metadata = metadata.unwrap_or_default();
        let status = match metadata.remove(METADATA_STATUS_KEY) {
            Some(Value::String(value)) => value.parse::<NodeStatus>().ok(),
            _ => None,
        };

        let node_id = self
            .store
            .add_node(
                &id,
                NodeSpec {
                    id: None,
                    kind,
                    label,
                    description,
                    status,
                    position,
                    parent_node,
                    metadata: Some(metadata),
                    style: None,
                },
            )
            .await
            .map_err(map_store_error)?;

        Ok(Json(AddNodeResponse {
            node_id: node_id.into_string(),
        }))
    }

    /// Connect two nodes with an edge; endpoints do not have to exist yet.
    #[tool(name = "add_edge")]
    async fn add_edge(
        &self,
        params: Parameters<AddEdgeParams>,
    ) -> Result<Json<AddEdgeResponse>, ErrorData> {
        let AddEdgeParams {
            flowchart_id,
            source,
            target,
            label,
            edge_type,
            animated,
        } = params.0;

        let id = parse_flowchart_id(&flowchart_id)?;
        let source = parse_node_id("source", &source)?;
        let target = parse_node_id("target", &target)?;
        let kind = edge_type
            .as_deref()
            .map(parse_edge_kind)
            .transpose()?;

        let edge_id = self
            .store
            .add_edge(
                &id,
                EdgeSpec {
                    id: None,
                    source,
                    target,
                    kind,
                    label,
                    animated,
                },
            )
            .await
            .map_err(map_store_error)?;

        Ok(Json(AddEdgeResponse {
            edge_id: edge_id.into_string(),
        }))
    }

    /// Update label, description, status, or metadata of an existing node.
    #[tool(name = "update_node")]
    async fn update_node(
        &self,
        params: Parameters<UpdateNodeParams>,
    ) -> Result<Json<AckResponse>, ErrorData> {
        let UpdateNodeParams {
            flowchart_id,
            node_id,
            label,
            description,
            status,
            metadata,
        } = params.0;

        let id = parse_flowchart_id(&flowchart_id)?;
        let node_id = parse_node_id("node_id", &node_id)?;
        let status = status
            .as_deref()
            .map(parse_node_status)
            .transpose()?;

        self.store
            .update_node(
                &id,
                &node_id,
                NodeUpdate {
                    label,
                    description,
                    status,
                    metadata,
                    ..NodeUpdate::default()
                },
            )
            .await
            .map_err(map_store_error)?;

        Ok(Json(AckResponse { success: true }))
    }

    /// Remove a node and every edge touching it.
    #[tool(name = "remove_node")]
    async fn remove_node(
        &self,
        params: Parameters<RemoveNodeParams>,
    ) -> Result<Json<AckResponse>, ErrorData> {
        let RemoveNodeParams {
            flowchart_id,
            node_id,
        } = params.0;

        let id = parse_flowchart_id(&flowchart_id)?;
        let node_id = parse_node_id("node_id", &node_id)?;

        self.store
            .remove_node(&id, &node_id)
            .await
            .map_err(map_store_error)?;

        Ok(Json(AckResponse { success: true }))
    }

    /// Remove an edge by id; removing an already absent edge still succeeds.
    #[tool(name = "remove_edge")]
    async fn remove_edge(
        &self,
        params: Parameters<RemoveEdgeParams>,
    ) -> Result<Json<AckResponse>, ErrorData> {
        let RemoveEdgeParams {
            flowchart_id,
            edge_id,
        } = params.0;

        let id = parse_flowchart_id(&flowchart_id)?;
        let edge_id = parse_edge_id(&edge_id)?;

        self.store
            .remove_edge(&id, &edge_id)
            .await
            .map_err(map_store_error)?;

        Ok(Json(AckResponse { success: true }))
    }

    /// Read the full flowchart document; use this as evidence before planning edits.
    #[tool(name = "read_flowchart")]
    async fn read_flowchart(
        &self,
        params: Parameters<ReadFlowchartParams>,
    ) -> Result<Json<FlowchartDocument>, ErrorData> {
        let ReadFlowchartParams { flowchart_id } = params.0;

        let id = parse_flowchart_id(&flowchart_id)?;
        let doc = self
            .store
            .read(&id)
            .map_err(map_store_error)?
            .ok_or_else(|| flowchart_not_found(&id))?;

        Ok(Json(doc))
    }

    /// Resolve the web editor URL for a flowchart on the running server.
    #[tool(name = "open_flowchart")]
    async fn open_flowchart(
        &self,
        params: Parameters<OpenFlowchartParams>,
    ) -> Result<Json<OpenFlowchartResponse>, ErrorData> {
        let OpenFlowchartParams { flowchart_id } = params.0;

        let id = parse_flowchart_id(&flowchart_id)?;
        if self.store.read(&id).map_err(map_store_error)?.is_none() {
            return Err(flowchart_not_found(&id));
        }

        Ok(Json(OpenFlowchartResponse {
            url: format!("http://localhost:{}/?id={id}", self.port),
        }))
    }

    /// Recompute node positions with the layered layout; run after bulk adds.
    #[tool(name = "auto_layout")]
    async fn auto_layout(
        &self,
        params: Parameters<AutoLayoutParams>,
    ) -> Result<Json<AutoLayoutResponse>, ErrorData> {
        let AutoLayoutParams {
            flowchart_id,
            direction,
            algorithm: _,
        } = params.0;

        let id = parse_flowchart_id(&flowchart_id)?;
        let label = direction.as_deref().unwrap_or("TB");
        let direction = label.parse::<LayoutDirection>().map_err(|_| {
            ErrorData::invalid_params(
                "invalid direction (expected TB|LR)",
                Some(serde_json::json!({ "direction": label })),
            )
        })?;

        let doc = self
            .store
            .auto_layout(&id, direction)
            .await
            .map_err(map_store_error)?;

        Ok(Json(AutoLayoutResponse {
            success: true,
            nodes_positioned: doc.nodes().len() as u64,
            direction: direction.as_str().to_owned(),
        }))
    }
}

#[tool_handler]
impl ServerHandler for FlowplanMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Flowplan flowchart server (tools: create_flowchart, add_node, add_edge, update_node, remove_node, remove_edge, read_flowchart, open_flowchart, auto_layout)"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

fn parse_flowchart_id(value: &str) -> Result<FlowchartId, ErrorData> {
    FlowchartId::new(value).map_err(|err| {
        ErrorData::invalid_params(
            format!("invalid flowchart_id: {err}"),
            Some(serde_json::json!({ "flowchart_id": value })),
        )
    })
}

fn parse_node_id(field: &str, value: &str) -> Result<NodeId, ErrorData> {
    NodeId::new(value).map_err(|err| {
        ErrorData::invalid_params(
            format!("invalid {field}: {err}"),
            Some(serde_json::json!({ field: value })),
        )
    })
}

fn parse_edge_id(value: &str) -> Result<EdgeId, ErrorData> {
    EdgeId::new(value).map_err(|err| {
        ErrorData::invalid_params(
            format!("invalid edge_id: {err}"),
            Some(serde_json::json!({ "edge_id": value })),
        )
    })
}

fn parse_node_kind(value: &str) -> Result<NodeKind, ErrorData> {
    value.parse::<NodeKind>().map_err(|err| {
        ErrorData::invalid_params(
            format!("invalid type: {err}"),
            Some(serde_json::json!({ "type": value })),
        )
    })
}

fn parse_node_status(value: &str) -> Result<NodeStatus, ErrorData> {
    value.parse::<NodeStatus>().map_err(|err| {
        ErrorData::invalid_params(
            format!("invalid status: {err}"),
            Some(serde_json::json!({ "status": value })),
        )
    })
}

fn parse_edge_kind(value: &str) -> Result<EdgeKind, ErrorData> {
    value.parse::<EdgeKind>().map_err(|err| {
        ErrorData::invalid_params(
            format!("invalid type: {err}"),
            Some(serde_json::json!({ "type": value })),
        )
    })
}

fn flowchart_not_found(id: &FlowchartId) -> ErrorData {
    ErrorData::resource_not_found(
        "flowchart not found",
        Some(serde_json::json!({ "flowchart_id": id.as_str() })),
    )
}

fn map_store_error(err: StoreError) -> ErrorData {
    match &err {
        StoreError::NotFound { id } => flowchart_not_found(id),
        StoreError::NodeNotFound { id, node_id } => ErrorData::resource_not_found(
            "node not found",
            Some(serde_json::json!({
                "flowchart_id": id.as_str(),
                "node_id": node_id.as_str(),
            })),
        ),
        StoreError::InvalidName { name } => ErrorData::invalid_params(
            err.to_string(),
            Some(serde_json::json!({ "name": name })),
        ),
        _ => ErrorData::internal_error(err.to_string(), None),
    }
}

#[cfg(test)]
mod e2e;
