//! Tab manager: concurrently open flows, their last-saved snapshots, and
//! cached validation state.
//!
//! The saved snapshot is the diff baseline for "unsaved changes" badges.
//! Validation is cached, never recomputed here — the tab bar is queried on
//! every render and must stay cheap.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::config::DirtyPolicy;
use crate::model::{GraphEdge, GraphNode};
use crate::validate::ValidationResult;

pub struct FlowTabState {
    pub flow_id: String,
    saved_nodes: Vec<GraphNode>,
    saved_edges: Vec<GraphEdge>,
    validation: Option<ValidationResult>,
}

pub struct TabManager {
    tabs: Vec<FlowTabState>,
    active: Option<String>,
    policy: DirtyPolicy,
}

impl TabManager {
    pub fn new(policy: DirtyPolicy) -> Self {
        TabManager {
            tabs: vec![],
            active: None,
            policy,
        }
    }

    /// Open a tab for `flow_id` with its persisted snapshot, and make it
    /// active. Re-opening an already open flow just activates it.
    pub fn open(&mut self, flow_id: &str, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) {
        if !self.tabs.iter().any(|t| t.flow_id == flow_id) {
            self.tabs.push(FlowTabState {
                flow_id: flow_id.to_string(),
                saved_nodes: nodes,
                saved_edges: edges,
                validation: None,
            });
        }
        self.active = Some(flow_id.to_string());
    }

    pub fn close(&mut self, flow_id: &str) {
        self.tabs.retain(|t| t.flow_id != flow_id);
        if self.active.as_deref() == Some(flow_id) {
            self.active = self.tabs.first().map(|t| t.flow_id.clone());
        }
    }

    pub fn activate(&mut self, flow_id: &str) -> bool {
        if self.tabs.iter().any(|t| t.flow_id == flow_id) {
            self.active = Some(flow_id.to_string());
            true
        } else {
            false
        }
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Open flow ids in tab order.
    pub fn open_ids(&self) -> Vec<&str> {
        self.tabs.iter().map(|t| t.flow_id.as_str()).collect()
    }

    pub fn is_open(&self, flow_id: &str) -> bool {
        self.tabs.iter().any(|t| t.flow_id == flow_id)
    }

    /// Reset the saved snapshot after a successful persist.
    pub fn mark_saved(&mut self, flow_id: &str, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) {
        let Some(tab) = self.tabs.iter_mut().find(|t| t.flow_id == flow_id) else {
            debug!(flow_id, "mark_saved for unopened flow ignored");
            return;
        };
        tab.saved_nodes = nodes;
        tab.saved_edges = edges;
    }

    /// Store the latest validation outcome for the error badge.
    pub fn cache_validation(&mut self, flow_id: &str, result: ValidationResult) {
        if let Some(tab) = self.tabs.iter_mut().find(|t| t.flow_id == flow_id) {
            tab.validation = Some(result);
        }
    }

    /// Cached error flag only. A flow that was never validated reports no
    /// errors rather than triggering a recompute.
    pub fn has_errors(&self, flow_id: &str) -> bool {
        self.tabs
            .iter()
            .find(|t| t.flow_id == flow_id)
            .and_then(|t| t.validation.as_ref())
            .is_some_and(|v| !v.valid)
    }

    pub fn cached_validation(&self, flow_id: &str) -> Option<&ValidationResult> {
        self.tabs
            .iter()
            .find(|t| t.flow_id == flow_id)
            .and_then(|t| t.validation.as_ref())
    }

    /// Structural comparison against the saved snapshot. Node presence is
    /// compared by `(id, config)`, edge presence as a set keyed by
    /// `(source, target, sourceHandle, targetHandle)`. Whether position-only
    /// moves count is the configured `DirtyPolicy`.
    pub fn has_unsaved_changes(
        &self,
        flow_id: &str,
        current_nodes: &[GraphNode],
        current_edges: &[GraphEdge],
    ) -> bool {
        let Some(tab) = self.tabs.iter().find(|t| t.flow_id == flow_id) else {
            // Nothing was ever saved for this flow.
            return true;
        };

        self.nodes_differ(&tab.saved_nodes, current_nodes)
            || edges_differ(&tab.saved_edges, current_edges)
    }

    fn nodes_differ(&self, saved: &[GraphNode], current: &[GraphNode]) -> bool {
        if saved.len() != current.len() {
            return true;
        }
        let saved_by_id: HashMap<&str, &GraphNode> =
            saved.iter().map(|n| (n.id.as_str(), n)).collect();
        for node in current {
            let Some(prev) = saved_by_id.get(node.id.as_str()) else {
                return true;
            };
            if prev.type_id != node.type_id || prev.config != node.config {
                return true;
            }
            if self.policy == DirtyPolicy::IncludePositions && prev.position != node.position {
                return true;
            }
        }
        false
    }
}

type EdgeKey<'a> = (&'a str, &'a str, Option<&'a str>, Option<&'a str>);

fn edge_key(edge: &GraphEdge) -> EdgeKey<'_> {
    (
        edge.source.as_str(),
        edge.target.as_str(),
        edge.source_handle.as_deref(),
        edge.target_handle.as_deref(),
    )
}

fn edges_differ(saved: &[GraphEdge], current: &[GraphEdge]) -> bool {
    if saved.len() != current.len() {
        return true;
    }
    let saved_keys: HashSet<EdgeKey<'_>> = saved.iter().map(edge_key).collect();
    current.iter().any(|e| !saved_keys.contains(&edge_key(e)))
}
