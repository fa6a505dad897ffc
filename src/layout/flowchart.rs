// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::model::{EdgeKind, FlowchartDocument, NodeId, NodeKind, Position};

const NODE_WIDTH: f64 = 180.0;
const NODE_HEIGHT: f64 = 60.0;
const GROUP_PADDING: f64 = 40.0;
const MIN_GROUP_WIDTH: f64 = NODE_WIDTH * 2.0;
const MIN_GROUP_HEIGHT: f64 = NODE_HEIGHT * 2.0;
const NODE_SPACING: f64 = 50.0;
const LAYER_SPACING: f64 = 80.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutDirection {
    #[default]
    TopToBottom,
    LeftToRight,
}

impl LayoutDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopToBottom => "TB",
            Self::LeftToRight => "LR",
        }
    }
}

impl fmt::Display for LayoutDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLayoutDirectionError {
    pub value: String,
}

impl fmt::Display for ParseLayoutDirectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown layout direction: {}", self.value)
    }
}

impl std::error::Error for ParseLayoutDirectionError {}

impl FromStr for LayoutDirection {
    type Err = ParseLayoutDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TB" => Ok(Self::TopToBottom),
            "LR" => Ok(Self::LeftToRight),
            other => Err(ParseLayoutDirectionError {
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowchartLayoutError {
    DuplicateNode { node_id: NodeId },
}

impl fmt::Display for FlowchartLayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNode { node_id } => {
                write!(f, "duplicate node id '{node_id}' in layout input")
            }
        }
    }
}

impl std::error::Error for FlowchartLayoutError {}

/// One box participating in a layered layout pass. Plain nodes use the
/// default footprint; groups carry the dimensions computed from their
/// own sub-layout.
#[derive(Debug, Clone, PartialEq)]
struct LayoutItem {
    id: NodeId,
    width: f64,
    height: f64,
}

impl LayoutItem {
    fn plain(id: NodeId) -> Self {
        Self {
            id,
            width: NODE_WIDTH,
            height: NODE_HEIGHT,
        }
    }
}

#[derive(Debug, Default)]
struct PlacementPlan {
    positions: BTreeMap<NodeId, Position>,
    group_dimensions: BTreeMap<NodeId, (f64, f64)>,
}

/// Recomputes node positions from edge topology with a layered layout.
///
/// Layout rules:
/// - Presentation annotation nodes keep their current position verbatim.
/// - `failure` edges encode backward control flow (retry loops) and are
///   excluded from the layout graph so they cannot fold the arrangement
///   back on itself.
/// - Nodes referencing a `phase_group` through `parentNode` are arranged
///   inside that group with parent-relative coordinates; the group itself
///   participates at the top level sized to fit its members, with the
///   computed dimensions written into its `data.style`.
/// - A node whose `parentNode` names a missing node, or a node that is not
///   a group, is left untouched.
///
/// The result is a fresh document with `version` incremented and
/// `updatedAt` restamped; the input document is never modified, including
/// when the layout is rejected.
pub fn auto_layout(
    doc: &FlowchartDocument,
    direction: LayoutDirection,
) -> Result<FlowchartDocument, FlowchartLayoutError> {
    let mut seen = BTreeSet::new();
    for node in doc.nodes() {
        if !seen.insert(node.id().clone()) {
            return Err(FlowchartLayoutError::DuplicateNode {
                node_id: node.id().clone(),
            });
        }
    }

    let plan = compute_placement(doc, direction);

    let mut next = doc.clone();
    for node in next.nodes_mut() {
        if let Some(position) = plan.positions.get(node.id()) {
            node.set_position(*position);
        }
        if let Some(&(width, height)) = plan.group_dimensions.get(node.id()) {
            let style = node.data_mut().style_mut();
            style.insert("width".to_string(), serde_json::json!(width));
            style.insert("height".to_string(), serde_json::json!(height));
        }
    }
    next.bump_version();
    Ok(next)
}

fn compute_placement(doc: &FlowchartDocument, direction: LayoutDirection) -> PlacementPlan {
    let mut plan = PlacementPlan::default();

    let group_ids = doc
        .nodes()
        .iter()
        .filter(|node| node.kind() == NodeKind::PhaseGroup)
        .map(|node| node.id().clone())
        .collect::<BTreeSet<_>>();

    // Membership in document order, restricted to references that actually
    // name a group. Anything else keeps its position.
    let mut members = BTreeMap::<NodeId, Vec<NodeId>>::new();
    let mut member_of = BTreeMap::<NodeId, NodeId>::new();
    for node in doc.nodes() {
        if node.kind().is_annotation() {
            continue;
        }
        let Some(parent) = node.parent_node() else {
            continue;
        };
        if group_ids.contains(parent) {
            members
                .entry(parent.clone())
                .or_default()
                .push(node.id().clone());
            member_of.insert(node.id().clone(), parent.clone());
        }
    }

    // Sub-layout each top-level group first so its dimensions are known when
    // the top-level pass runs. Grouping is single-level in practice; a group
    // that is itself a member degrades to a plain box inside its parent and
    // its own members keep their positions.
    let mut top_items = Vec::<LayoutItem>::new();
    for node in doc.nodes() {
        if node.kind().is_annotation() || node.parent_node().is_some() {
            continue;
        }
        if node.kind() == NodeKind::PhaseGroup {
            let group_members = members.get(node.id()).map(Vec::as_slice).unwrap_or(&[]);
            let (width, height) = layout_group(doc, group_members, direction, &mut plan);
            plan.group_dimensions
                .insert(node.id().clone(), (width, height));
            top_items.push(LayoutItem {
                id: node.id().clone(),
                width,
                height,
            });
        } else {
            top_items.push(LayoutItem::plain(node.id().clone()));
        }
    }

    let top_index = top_items
        .iter()
        .enumerate()
        .map(|(idx, item)| (item.id.clone(), idx))
        .collect::<BTreeMap<_, _>>();

    // Edges between top-level items, with member endpoints lifted to their
    // containing group. Remapped self-loops say nothing about ordering and
    // are dropped.
    let mut top_edges = Vec::<(usize, usize)>::new();
    for edge in doc.edges() {
        if edge.kind() == EdgeKind::Failure {
            continue;
        }
        let source = top_representative(edge.source(), &member_of, &top_index);
        let target = top_representative(edge.target(), &member_of, &top_index);
        if let (Some(source), Some(target)) = (source, target) {
            if source != target {
                top_edges.push((source, target));
            }
        }
    }

    for (id, position) in layered_positions(&top_items, &top_edges, direction) {
        plan.positions.insert(id, position);
    }

    plan
}

fn top_representative(
    node_id: &NodeId,
    member_of: &BTreeMap<NodeId, NodeId>,
    top_index: &BTreeMap<NodeId, usize>,
) -> Option<usize> {
    match member_of.get(node_id) {
        Some(group_id) => top_index.get(group_id).copied(),
        None => top_index.get(node_id).copied(),
    }
}

/// Lays out one group's members in group-relative coordinates and returns
/// the group dimensions needed to contain them.
fn layout_group(
    doc: &FlowchartDocument,
    group_members: &[NodeId],
    direction: LayoutDirection,
    plan: &mut PlacementPlan,
) -> (f64, f64) {
    if group_members.is_empty() {
        return (MIN_GROUP_WIDTH, MIN_GROUP_HEIGHT);
    }

    let items = group_members
        .iter()
        .map(|id| LayoutItem::plain(id.clone()))
        .collect::<Vec<_>>();
    let index = items
        .iter()
        .enumerate()
        .map(|(idx, item)| (item.id.clone(), idx))
        .collect::<BTreeMap<_, _>>();

    let mut edges = Vec::<(usize, usize)>::new();
    for edge in doc.edges() {
        if edge.kind() == EdgeKind::Failure {
            continue;
        }
        let (Some(&source), Some(&target)) = (index.get(edge.source()), index.get(edge.target()))
        else {
            continue;
        };
        if source != target {
            edges.push((source, target));
        }
    }

    let positions = layered_positions(&items, &edges, direction);

    let mut extent_x = 0f64;
    let mut extent_y = 0f64;
    for item in &items {
        let Some(position) = positions.get(&item.id) else {
            continue;
        };
        extent_x = extent_x.max(position.x() + item.width);
        extent_y = extent_y.max(position.y() + item.height);
    }

    for (id, position) in positions {
        plan.positions.insert(
            id,
            Position::new(position.x() + GROUP_PADDING, position.y() + GROUP_PADDING),
        );
    }

    (
        (extent_x + GROUP_PADDING * 2.0).max(MIN_GROUP_WIDTH),
        (extent_y + GROUP_PADDING * 2.0).max(MIN_GROUP_HEIGHT),
    )
}

/// Layered placement over an item list. Items keep document order as the
/// deterministic baseline; edges only influence layering and the barycenter
/// ordering sweep.
fn layered_positions(
    items: &[LayoutItem],
    edges: &[(usize, usize)],
    direction: LayoutDirection,
) -> BTreeMap<NodeId, Position> {
    if items.is_empty() {
        return BTreeMap::new();
    }

    let mut incoming = vec![Vec::<usize>::new(); items.len()];
    let mut predecessors = vec![Vec::<usize>::new(); items.len()];
    for &(source, target) in edges {
        incoming[target].push(source);
        predecessors[target].push(source);
    }
    for preds in &mut predecessors {
        preds.sort_unstable();
    }

    let item_layers = assign_layers(items.len(), &incoming);

    let max_layer = item_layers.iter().copied().max().unwrap_or(0);
    let mut layers = vec![Vec::<usize>::new(); max_layer + 1];
    for (idx, layer) in item_layers.iter().enumerate() {
        layers[*layer].push(idx);
    }

    // One downward barycenter sweep for readability (deterministic).
    for layer_idx in 1..layers.len() {
        let prev_positions = layers[layer_idx - 1]
            .iter()
            .enumerate()
            .map(|(pos, idx)| (*idx, pos))
            .collect::<BTreeMap<_, _>>();
        sort_layer_by_barycenter(&mut layers[layer_idx], &prev_positions, &predecessors);
    }

    assign_coordinates(items, &layers, direction)
}

/// Longest-path layering that tolerates cycles: whenever no item has all of
/// its predecessors placed, the earliest unplaced item is forced onto the
/// next layer its placed predecessors allow, turning the remaining edges
/// into backward edges instead of failing.
fn assign_layers(item_count: usize, incoming: &[Vec<usize>]) -> Vec<usize> {
    const UNASSIGNED: usize = usize::MAX;

    let mut layers = vec![UNASSIGNED; item_count];
    let mut assigned = 0usize;

    while assigned < item_count {
        let mut progressed = false;
        for idx in 0..item_count {
            if layers[idx] != UNASSIGNED {
                continue;
            }
            let ready = incoming[idx]
                .iter()
                .all(|&pred| pred == idx || layers[pred] != UNASSIGNED);
            if !ready {
                continue;
            }
            layers[idx] = incoming[idx]
                .iter()
                .filter(|&&pred| pred != idx)
                .map(|&pred| layers[pred] + 1)
                .max()
                .unwrap_or(0);
            assigned += 1;
            progressed = true;
        }

        if !progressed {
            let Some(idx) = (0..item_count).find(|&idx| layers[idx] == UNASSIGNED) else {
                break;
            };
            layers[idx] = incoming[idx]
                .iter()
                .filter(|&&pred| pred != idx && layers[pred] != UNASSIGNED)
                .map(|&pred| layers[pred] + 1)
                .max()
                .unwrap_or(0);
            assigned += 1;
        }
    }

    layers
}

fn sort_layer_by_barycenter(
    layer_items: &mut [usize],
    prev_positions: &BTreeMap<usize, usize>,
    predecessors: &[Vec<usize>],
) {
    let barycenter = |idx: usize| {
        let (sum, count) = predecessors[idx]
            .iter()
            .filter_map(|pred| prev_positions.get(pred).copied())
            .fold((0usize, 0usize), |(sum, count), pos| (sum + pos, count + 1));
        (count > 0).then_some((sum, count))
    };

    layer_items.sort_by(|&a, &b| {
        match (barycenter(a), barycenter(b)) {
            (None, None) => a.cmp(&b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (Some((sum_a, count_a)), Some((sum_b, count_b))) => {
                // Compare sum_a/count_a vs sum_b/count_b without floats.
                let left = (sum_a as u128) * (count_b as u128);
                let right = (sum_b as u128) * (count_a as u128);
                left.cmp(&right).then_with(|| a.cmp(&b))
            }
        }
    });
}

/// Converts layered ordering into top-left pixel coordinates. Layers are
/// stacked along the flow axis with a fixed gap; within a layer, items sit
/// side by side and every layer is centered against the widest one.
fn assign_coordinates(
    items: &[LayoutItem],
    layers: &[Vec<usize>],
    direction: LayoutDirection,
) -> BTreeMap<NodeId, Position> {
    let cross_extent = |layer: &[usize]| -> f64 {
        let total: f64 = layer
            .iter()
            .map(|&idx| match direction {
                LayoutDirection::TopToBottom => items[idx].width,
                LayoutDirection::LeftToRight => items[idx].height,
            })
            .sum();
        let gaps = layer.len().saturating_sub(1) as f64 * NODE_SPACING;
        total + gaps
    };
    let main_extent = |layer: &[usize]| -> f64 {
        layer
            .iter()
            .map(|&idx| match direction {
                LayoutDirection::TopToBottom => items[idx].height,
                LayoutDirection::LeftToRight => items[idx].width,
            })
            .fold(0f64, f64::max)
    };

    let max_cross = layers
        .iter()
        .map(|layer| cross_extent(layer))
        .fold(0f64, f64::max);

    let mut positions = BTreeMap::new();
    let mut main_offset = 0f64;
    for layer in layers {
        let extent = main_extent(layer);
        let mut cross = (max_cross - cross_extent(layer)) / 2.0;
        for &idx in layer {
            let item = &items[idx];
            let position = match direction {
                LayoutDirection::TopToBottom => {
                    let position = Position::new(cross, main_offset + (extent - item.height) / 2.0);
                    cross += item.width + NODE_SPACING;
                    position
                }
                LayoutDirection::LeftToRight => {
                    let position = Position::new(main_offset + (extent - item.width) / 2.0, cross);
                    cross += item.height + NODE_SPACING;
                    position
                }
            };
            positions.insert(item.id.clone(), position);
        }
        main_offset += extent + LAYER_SPACING;
    }

    positions
}
