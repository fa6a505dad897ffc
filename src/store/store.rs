// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, OnceLock, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use regex::Regex;
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};

use crate::layout::{auto_layout, LayoutDirection};
use crate::model::{
    DocumentPatch, EdgeId, EdgeKind, FlowEdge, FlowNode, FlowchartDocument, FlowchartId,
    FlowchartSummary, NodeId, NodeKind, NodeStatus, Position,
};

use super::flowchart_dir::{FlowchartDir, StoreError};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// How long a detected file change is still attributed to the store's own
/// atomic rename instead of an external edit.
const SELF_WRITE_SUPPRESS_WINDOW: Duration = Duration::from_millis(100);

const DEFAULT_NODE_POSITION: Position = Position::new(100.0, 100.0);
const BASIC_TEMPLATE: &str = "basic";

/// A change to one document, delivered to every subscriber after the write
/// that produced it completed. There is no buffering or replay; a subscriber
/// that lags re-fetches current state instead.
#[derive(Debug, Clone)]
pub struct StoreEvent {
    pub id: FlowchartId,
    pub document: Arc<FlowchartDocument>,
}

/// Caller-provided fields for a new node; everything optional falls back to
/// the documented defaults (origin position, pending status, empty maps).
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub id: Option<NodeId>,
    pub kind: NodeKind,
    pub label: String,
    pub description: Option<String>,
    pub status: Option<NodeStatus>,
    pub position: Option<Position>,
    pub parent_node: Option<NodeId>,
    pub metadata: Option<BTreeMap<String, Value>>,
    pub style: Option<BTreeMap<String, Value>>,
}

impl NodeSpec {
    pub fn new(kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            label: label.into(),
            description: None,
            status: None,
            position: None,
            parent_node: None,
            metadata: None,
            style: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EdgeSpec {
    pub id: Option<EdgeId>,
    pub source: NodeId,
    pub target: NodeId,
    pub kind: Option<EdgeKind>,
    pub label: Option<String>,
    pub animated: Option<bool>,
}

impl EdgeSpec {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            id: None,
            source,
            target,
            kind: None,
            label: None,
            animated: None,
        }
    }
}

/// Field updates for one node. `None` leaves a field alone; `metadata` and
/// `style` merge key-wise into the existing maps instead of replacing them.
/// `parent_node` is doubly optional so callers can distinguish "leave it"
/// (`None`) from "clear it" (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct NodeUpdate {
    pub position: Option<Position>,
    pub parent_node: Option<Option<NodeId>>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub status: Option<NodeStatus>,
    pub metadata: Option<BTreeMap<String, Value>>,
    pub style: Option<BTreeMap<String, Value>>,
}

/// Single source of truth for every flowchart in one project directory.
///
/// All mutations follow the same discipline: take the document's mutex, read
/// the persisted revision, apply the change, bump `version`, write the whole
/// document back atomically, then emit a change event. Two concurrent
/// mutations of the same document therefore serialize instead of producing a
/// lost update, and a reader never observes a torn file.
pub struct FlowchartStore {
    dir: FlowchartDir,
    doc_locks: Mutex<BTreeMap<FlowchartId, Arc<Mutex<()>>>>,
    events: broadcast::Sender<StoreEvent>,
    self_writes: StdMutex<BTreeMap<String, Instant>>,
    closed: AtomicBool,
}

impl FlowchartStore {
    pub fn new(dir: FlowchartDir) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            dir,
            doc_locks: Mutex::new(BTreeMap::new()),
            events,
            self_writes: StdMutex::new(BTreeMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn dir(&self) -> &FlowchartDir {
        &self.dir
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Stops the directory watcher attached to this store. Direct operations
    /// keep working; only watch-triggered change detection ends. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Creates a new versioned document and returns its id.
    ///
    /// Without an explicit `id` the id is derived from `name` by slugifying;
    /// a name with no usable characters is rejected. An existing document
    /// under the same id is silently overwritten; callers that need collision
    /// safety check `list` first.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        template: Option<&str>,
        id: Option<FlowchartId>,
    ) -> Result<FlowchartId, StoreError> {
        let id = match id {
            Some(id) => id,
            None => FlowchartId::new(slugify(name))
                .map_err(|_| StoreError::InvalidName {
                    name: name.to_string(),
                })?,
        };

        let mut doc = FlowchartDocument::new(id.clone(), name, description);
        if template == Some(BASIC_TEMPLATE) {
            doc.nodes_mut().push(template_node(
                NodeKind::Start,
                "Start",
                Position::new(250.0, 50.0),
            ));
            doc.nodes_mut().push(template_node(
                NodeKind::End,
                "End",
                Position::new(250.0, 350.0),
            ));
        }

        let lock = self.doc_lock(&id).await;
        let _guard = lock.lock().await;
        self.persist_and_emit(&doc)?;
        Ok(id)
    }

    /// Returns the persisted document, or `None` when no file exists. Only
    /// undecodable content is an error.
    pub fn read(&self, id: &FlowchartId) -> Result<Option<FlowchartDocument>, StoreError> {
        self.dir.load_document(id)
    }

    /// Shallow-merges the patch over the persisted document. The id can never
    /// change through this path; the patch type has no such field.
    pub async fn update(
        &self,
        id: &FlowchartId,
        patch: DocumentPatch,
    ) -> Result<FlowchartDocument, StoreError> {
        let (doc, ()) = self
            .mutate(id, |doc| {
                doc.apply_patch(patch);
                Ok(())
            })
            .await?;
        Ok(doc)
    }

    /// Create-if-absent, else update: the REST PUT semantics. A fresh
    /// document takes the URL id verbatim, its name falling back to the id
    /// when the payload has none, and lands at version 1; an existing one
    /// goes through the normal shallow merge and version bump.
    pub async fn upsert(
        &self,
        id: &FlowchartId,
        patch: DocumentPatch,
    ) -> Result<FlowchartDocument, StoreError> {
        let lock = self.doc_lock(id).await;
        let _guard = lock.lock().await;

        let doc = match self.dir.load_document(id)? {
            Some(mut doc) => {
                doc.apply_patch(patch);
                doc.bump_version();
                doc
            }
            None => {
                let name = patch
                    .name
                    .clone()
                    .unwrap_or_else(|| id.as_str().to_string());
                let mut doc = FlowchartDocument::new(id.clone(), name, "");
                doc.apply_patch(patch);
                doc
            }
        };
        self.persist_and_emit(&doc)?;
        Ok(doc)
    }

    /// Appends a node, synthesizing `{type}-{suffix}` when no id is given,
    /// and returns the node id actually used.
    pub async fn add_node(&self, id: &FlowchartId, spec: NodeSpec) -> Result<NodeId, StoreError> {
        let (_, node_id) = self
            .mutate(id, move |doc| {
                let node_id = match spec.id {
                    Some(node_id) => node_id,
                    None => generated_node_id(spec.kind),
                };

                let mut node = FlowNode::new(node_id.clone(), spec.kind);
                node.set_position(spec.position.unwrap_or(DEFAULT_NODE_POSITION));
                node.set_parent_node(spec.parent_node);
                let data = node.data_mut();
                data.set_label(spec.label);
                data.set_description(spec.description.unwrap_or_default());
                data.set_status(spec.status.unwrap_or_default());
                *data.metadata_mut() = spec.metadata.unwrap_or_default();
                *data.style_mut() = spec.style.unwrap_or_default();

                doc.nodes_mut().push(node);
                Ok(node_id)
            })
            .await?;
        Ok(node_id)
    }

    /// Removes the node and every edge touching it.
    pub async fn remove_node(&self, id: &FlowchartId, node_id: &NodeId) -> Result<(), StoreError> {
        let owner = id.clone();
        let target = node_id.clone();
        self.mutate(id, move |doc| {
            if !doc.remove_node(&target) {
                return Err(StoreError::NodeNotFound {
                    id: owner,
                    node_id: target,
                });
            }
            Ok(())
        })
        .await?;
        Ok(())
    }

    /// Appends an edge, synthesizing `edge-{suffix}` when no id is given.
    /// Endpoints are not required to exist; dangling edges are tolerated.
    pub async fn add_edge(&self, id: &FlowchartId, spec: EdgeSpec) -> Result<EdgeId, StoreError> {
        let (_, edge_id) = self
            .mutate(id, move |doc| {
                let edge_id = match spec.id {
                    Some(edge_id) => edge_id,
                    None => generated_edge_id(),
                };

                let mut edge = FlowEdge::new(edge_id.clone(), spec.source, spec.target);
                edge.set_kind(spec.kind.unwrap_or_default());
                let data = edge.data_mut();
                data.set_label(spec.label.unwrap_or_default());
                data.set_animated(spec.animated.unwrap_or_default());

                doc.edges_mut().push(edge);
                Ok(edge_id)
            })
            .await?;
        Ok(edge_id)
    }

    /// Removes the edge if present. A missing edge id is not an error; the
    /// document still advances a version.
    pub async fn remove_edge(&self, id: &FlowchartId, edge_id: &EdgeId) -> Result<(), StoreError> {
        let target = edge_id.clone();
        self.mutate(id, move |doc| {
            doc.remove_edge(&target);
            Ok(())
        })
        .await?;
        Ok(())
    }

    pub async fn update_node(
        &self,
        id: &FlowchartId,
        node_id: &NodeId,
        update: NodeUpdate,
    ) -> Result<(), StoreError> {
        let owner = id.clone();
        let target = node_id.clone();
        self.mutate(id, move |doc| {
            let Some(node) = doc.node_mut(&target) else {
                return Err(StoreError::NodeNotFound {
                    id: owner,
                    node_id: target,
                });
            };

            if let Some(position) = update.position {
                node.set_position(position);
            }
            if let Some(parent_node) = update.parent_node {
                node.set_parent_node(parent_node);
            }
            let data = node.data_mut();
            if let Some(label) = update.label {
                data.set_label(label);
            }
            if let Some(description) = update.description {
                data.set_description(description);
            }
            if let Some(status) = update.status {
                data.set_status(status);
            }
            if let Some(metadata) = update.metadata {
                data.metadata_mut().extend(metadata);
            }
            if let Some(style) = update.style {
                data.style_mut().extend(style);
            }
            Ok(())
        })
        .await?;
        Ok(())
    }

    /// Recomputes node positions and persists the result as a new revision.
    /// A rejected layout leaves the document untouched on disk.
    pub async fn auto_layout(
        &self,
        id: &FlowchartId,
        direction: LayoutDirection,
    ) -> Result<FlowchartDocument, StoreError> {
        let lock = self.doc_lock(id).await;
        let _guard = lock.lock().await;

        let doc = self
            .dir
            .load_document(id)?
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;
        let laid = auto_layout(&doc, direction).map_err(|source| StoreError::Layout {
            id: id.clone(),
            source: Box::new(source),
        })?;
        self.persist_and_emit(&laid)?;
        Ok(laid)
    }

    /// Summaries of every decodable document in the project.
    pub fn list(&self) -> Result<Vec<FlowchartSummary>, StoreError> {
        self.dir.list_summaries()
    }

    /// Emits a change observed through the watch path, bypassing version
    /// bookkeeping; the document was produced outside this process.
    pub(crate) fn emit_external(&self, id: FlowchartId, document: FlowchartDocument) {
        let _ = self.events.send(StoreEvent {
            id,
            document: Arc::new(document),
        });
    }

    /// Consumes a pending self-write marker for `file_name`. Returns true if
    /// the change being examined was caused by this store within the
    /// suppression window and must not surface as an external edit.
    pub(crate) fn take_self_write(&self, file_name: &str) -> bool {
        let mut writes = self
            .self_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        writes.retain(|_, deadline| *deadline > now);
        writes.remove(file_name).is_some()
    }

    fn note_self_write(&self, file_name: &str) {
        let mut writes = self
            .self_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let deadline = Instant::now() + SELF_WRITE_SUPPRESS_WINDOW;
        let entry = writes.entry(file_name.to_string()).or_insert(deadline);
        // Saturating: a second write inside the window extends the deadline,
        // it never shortens it.
        *entry = (*entry).max(deadline);
    }

    async fn doc_lock(&self, id: &FlowchartId) -> Arc<Mutex<()>> {
        let mut locks = self.doc_locks.lock().await;
        locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Shared read-modify-write path: load under the document mutex, apply,
    /// bump the version, persist atomically, emit. An error from `apply`
    /// aborts before anything reaches disk.
    async fn mutate<T>(
        &self,
        id: &FlowchartId,
        apply: impl FnOnce(&mut FlowchartDocument) -> Result<T, StoreError>,
    ) -> Result<(FlowchartDocument, T), StoreError> {
        let lock = self.doc_lock(id).await;
        let _guard = lock.lock().await;

        let mut doc = self
            .dir
            .load_document(id)?
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;
        let out = apply(&mut doc)?;
        doc.bump_version();
        self.persist_and_emit(&doc)?;
        Ok((doc, out))
    }

    fn persist_and_emit(&self, doc: &FlowchartDocument) -> Result<(), StoreError> {
        self.dir.save_document(doc)?;
        self.note_self_write(&FlowchartDir::document_file_name(doc.id()));
        let _ = self.events.send(StoreEvent {
            id: doc.id().clone(),
            document: Arc::new(doc.clone()),
        });
        Ok(())
    }
}

fn template_node(kind: NodeKind, label: &str, position: Position) -> FlowNode {
    let mut node = FlowNode::new(generated_node_id(kind), kind);
    node.set_position(position);
    node.data_mut().set_label(label);
    node
}

/// Lowercase, collapse non-alphanumeric runs to `-`, trim leading/trailing
/// separators: `"  Spaces & Symbols!  "` becomes `"spaces-symbols"`.
pub fn slugify(name: &str) -> String {
    static NON_ALPHANUMERIC: OnceLock<Regex> = OnceLock::new();
    let pattern = NON_ALPHANUMERIC
        .get_or_init(|| Regex::new("[^a-z0-9]+").expect("static pattern compiles"));
    let lowered = name.to_lowercase();
    pattern
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

fn generated_node_id(kind: NodeKind) -> NodeId {
    NodeId::new(format!("{}-{}", kind.as_str(), random_suffix()))
        .expect("generated id is valid (non-empty, no separator)")
}

fn generated_edge_id() -> EdgeId {
    EdgeId::new(format!("edge-{}", random_suffix()))
        .expect("generated id is valid (non-empty, no separator)")
}

/// Six characters from `[a-z0-9]`. Uniqueness is not guaranteed by
/// construction; collisions are accepted.
fn random_suffix() -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    const SUFFIX_LEN: usize = 6;
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    let salt = COUNTER
        .fetch_add(1, Ordering::Relaxed)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut state = (nanos ^ salt) | 1;

    let mut out = String::with_capacity(SUFFIX_LEN);
    for _ in 0..SUFFIX_LEN {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        out.push(ALPHABET[(state % ALPHABET.len() as u64) as usize] as char);
    }
    out
}
