// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A `FlowchartDocument` owns its nodes, edges, and annotation overlay; the
//! serde derives double as the wire and disk format (camelCase field names).

pub mod annotations;
pub mod document;
pub mod edge;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod ids;
pub mod node;

pub use annotations::{AnnotationArrow, AnnotationLayer, AnnotationStroke, StrokePoint};
pub use document::{
    now_timestamp, DocumentPatch, FlowchartDocument, FlowchartSummary, Viewport,
};
pub use edge::{EdgeData, EdgeKind, FlowEdge, ParseEdgeKindError};
pub use ids::{EdgeId, FlowchartId, Id, IdError, NodeId};
pub use node::{
    FlowNode, NodeData, NodeKind, NodeStatus, ParseNodeKindError, ParseNodeStatusError, Position,
};
