//! Graph store: sole writable owner of the live `GraphDefinition`.
//!
//! Node and edge collections live behind `Arc` and are replaced wholesale on
//! every mutation, so observers can detect change by pointer identity
//! (`Arc::ptr_eq`) instead of deep comparison. Mutations are synchronous and
//! serialized behind an internal lock; the lock is never held across an
//! await point.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::error::ValidationIssue;
use crate::model::{
    GraphDefinition, GraphEdge, GraphNode, NodeRunStatus, TraceEntry,
};
use crate::schema::{CONTRACT_VERSION, SchemaRegistry};
use crate::validate;

/// Result of an all-or-nothing store operation such as import.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub success: bool,
    pub errors: Vec<String>,
}

impl ImportOutcome {
    fn ok() -> Self {
        ImportOutcome {
            success: true,
            errors: vec![],
        }
    }

    fn rejected(issues: Vec<ValidationIssue>) -> Self {
        ImportOutcome {
            success: false,
            errors: issues.iter().map(ToString::to_string).collect(),
        }
    }
}

struct StoreState {
    graph_id: String,
    contract_version: u32,
    nodes: Arc<Vec<GraphNode>>,
    edges: Arc<Vec<GraphEdge>>,
}

pub struct GraphStore {
    inner: Mutex<StoreState>,
}

impl GraphStore {
    /// A store holding a fresh empty graph.
    pub fn new() -> Self {
        Self::from_definition(GraphDefinition::empty(CONTRACT_VERSION))
    }

    pub fn from_definition(definition: GraphDefinition) -> Self {
        GraphStore {
            inner: Mutex::new(StoreState {
                graph_id: definition.graph_id,
                contract_version: definition.contract_version,
                nodes: Arc::new(definition.nodes),
                edges: Arc::new(definition.edges),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        // A poisoned lock only means another thread panicked mid-mutation;
        // the graph itself is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------

    pub fn graph_id(&self) -> String {
        self.state().graph_id.clone()
    }

    /// Snapshot of the node collection. The `Arc` identity changes on every
    /// mutation that touches nodes.
    pub fn nodes(&self) -> Arc<Vec<GraphNode>> {
        Arc::clone(&self.state().nodes)
    }

    pub fn edges(&self) -> Arc<Vec<GraphEdge>> {
        Arc::clone(&self.state().edges)
    }

    /// Deep copy of the live graph, e.g. for run submission or export.
    pub fn definition(&self) -> GraphDefinition {
        let state = self.state();
        GraphDefinition {
            graph_id: state.graph_id.clone(),
            contract_version: state.contract_version,
            nodes: state.nodes.as_ref().clone(),
            edges: state.edges.as_ref().clone(),
        }
    }

    // -------------------------------------------------------------------
    // Bulk replacement
    // -------------------------------------------------------------------

    /// Replace the whole graph (flow switch, import).
    pub fn replace(&self, definition: GraphDefinition) {
        let mut state = self.state();
        info!(graph_id = %definition.graph_id, nodes = definition.nodes.len(), "graph replaced");
        state.graph_id = definition.graph_id;
        state.contract_version = definition.contract_version;
        state.nodes = Arc::new(definition.nodes);
        state.edges = Arc::new(definition.edges);
    }

    pub fn set_nodes(&self, nodes: Vec<GraphNode>) {
        self.state().nodes = Arc::new(nodes);
    }

    pub fn set_edges(&self, edges: Vec<GraphEdge>) {
        self.state().edges = Arc::new(edges);
    }

    /// Replace the nodes with a pure transform of the current collection.
    pub fn update_nodes(&self, f: impl FnOnce(&[GraphNode]) -> Vec<GraphNode>) {
        let mut state = self.state();
        state.nodes = Arc::new(f(&state.nodes));
    }

    /// Replace the edges with a pure transform of the current collection.
    pub fn update_edges(&self, f: impl FnOnce(&[GraphEdge]) -> Vec<GraphEdge>) {
        let mut state = self.state();
        state.edges = Arc::new(f(&state.edges));
    }

    // -------------------------------------------------------------------
    // Node mutations
    // -------------------------------------------------------------------

    /// Insert the node, or replace the node with the same id. Edges are
    /// untouched either way.
    pub fn upsert_node(&self, node: GraphNode) {
        let mut state = self.state();
        let mut nodes = state.nodes.as_ref().clone();
        match nodes.iter_mut().find(|n| n.id == node.id) {
            Some(existing) => *existing = node,
            None => nodes.push(node),
        }
        state.nodes = Arc::new(nodes);
    }

    /// Shallow-merge `patch` into the node's config, preserving unspecified
    /// keys. A missing node id is a silent no-op — callers observe the
    /// store, not a return value.
    pub fn update_node_config(
        &self,
        node_id: &str,
        patch: serde_json::Map<String, serde_json::Value>,
    ) {
        let mut state = self.state();
        if !state.nodes.iter().any(|n| n.id == node_id) {
            debug!(node_id, "config patch for unknown node ignored");
            return;
        }
        let mut nodes = state.nodes.as_ref().clone();
        for node in nodes.iter_mut() {
            if node.id == node_id {
                for (key, value) in patch {
                    node.config.insert(key, value);
                }
                break;
            }
        }
        state.nodes = Arc::new(nodes);
    }

    /// Remove the node and cascade: every edge touching it goes away in the
    /// same atomic update. This is what keeps the no-dangling-edge invariant.
    pub fn remove_node(&self, node_id: &str) {
        let mut state = self.state();
        let nodes: Vec<GraphNode> = state
            .nodes
            .iter()
            .filter(|n| n.id != node_id)
            .cloned()
            .collect();
        if nodes.len() == state.nodes.len() {
            debug!(node_id, "remove for unknown node ignored");
            return;
        }
        let edges: Vec<GraphEdge> = state
            .edges
            .iter()
            .filter(|e| e.source != node_id && e.target != node_id)
            .cloned()
            .collect();
        let cascaded = state.edges.len() - edges.len();
        if cascaded > 0 {
            debug!(node_id, cascaded, "cascaded edges removed with node");
        }
        state.nodes = Arc::new(nodes);
        state.edges = Arc::new(edges);
    }

    // -------------------------------------------------------------------
    // Edge mutations — structural shape only; semantic validity is the
    // validation engine's job. Cycles are not rejected here.
    // -------------------------------------------------------------------

    pub fn add_edge(&self, edge: GraphEdge) {
        self.add_edges(vec![edge]);
    }

    pub fn add_edges(&self, new_edges: Vec<GraphEdge>) {
        let mut state = self.state();
        let mut edges = state.edges.as_ref().clone();
        edges.extend(new_edges);
        state.edges = Arc::new(edges);
    }

    pub fn remove_edge(&self, edge_id: &str) {
        let mut state = self.state();
        let edges: Vec<GraphEdge> = state
            .edges
            .iter()
            .filter(|e| e.id != edge_id)
            .cloned()
            .collect();
        if edges.len() == state.edges.len() {
            debug!(edge_id, "remove for unknown edge ignored");
            return;
        }
        state.edges = Arc::new(edges);
    }

    // -------------------------------------------------------------------
    // Run status folding
    // -------------------------------------------------------------------

    pub fn set_node_status(&self, node_id: &str, status: NodeRunStatus) {
        let mut state = self.state();
        if !state.nodes.iter().any(|n| n.id == node_id) {
            return;
        }
        let mut nodes = state.nodes.as_ref().clone();
        for node in nodes.iter_mut() {
            if node.id == node_id {
                node.status = status;
                break;
            }
        }
        state.nodes = Arc::new(nodes);
    }

    /// Reset every node back to `Idle` (run start, tab switch).
    pub fn reset_statuses(&self) {
        let mut state = self.state();
        let mut nodes = state.nodes.as_ref().clone();
        for node in nodes.iter_mut() {
            node.status = NodeRunStatus::Idle;
        }
        state.nodes = Arc::new(nodes);
    }

    /// Fold a run trace into per-node statuses. Entries for nodes that no
    /// longer exist (edited mid-run) are skipped.
    pub fn apply_trace(&self, trace: &[TraceEntry]) {
        let mut state = self.state();
        let mut nodes = state.nodes.as_ref().clone();
        for entry in trace {
            match nodes.iter_mut().find(|n| n.id == entry.node_id) {
                Some(node) => node.status = entry.status,
                None => warn!(node_id = %entry.node_id, "trace entry for unknown node skipped"),
            }
        }
        state.nodes = Arc::new(nodes);
    }

    // -------------------------------------------------------------------
    // Import / export
    // -------------------------------------------------------------------

    /// Serialize the live graph to its canonical JSON wire form.
    pub fn export_graph(&self) -> String {
        crate::io::export_graph(&self.definition())
    }

    /// Parse and fully validate `json`, committing only on success.
    /// Any parse or validation failure leaves the current graph untouched.
    pub fn import_graph(&self, json: &str, registry: &SchemaRegistry) -> ImportOutcome {
        let definition = match crate::io::parse_graph(json) {
            Ok(d) => d,
            Err(issues) => return ImportOutcome::rejected(issues),
        };

        let issues = validate::collect_issues(&definition, registry);
        if !issues.is_empty() {
            warn!(
                graph_id = %definition.graph_id,
                issues = issues.len(),
                "import rejected by validation"
            );
            return ImportOutcome::rejected(issues);
        }

        self.replace(definition);
        ImportOutcome::ok()
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
