//! petgraph-based directed graph wrapper over a `GraphDefinition`.
//!
//! Used by the validation engine for adjacency and reachability queries.
//! Edges whose endpoints do not resolve are skipped here — the structural
//! pass reports them, and the remaining checks still run on the rest.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef};

use super::types::GraphDefinition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeLabel {
    pub edge_id: String,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
}

pub struct GraphTopology {
    pub graph: DiGraph<String, EdgeLabel>,
    pub node_indices: HashMap<String, NodeIndex>,
}

impl GraphTopology {
    pub fn build(definition: &GraphDefinition) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        for node in &definition.nodes {
            let idx = graph.add_node(node.id.clone());
            node_indices.insert(node.id.clone(), idx);
        }

        for edge in &definition.edges {
            if let (Some(&s), Some(&t)) = (
                node_indices.get(&edge.source),
                node_indices.get(&edge.target),
            ) {
                graph.add_edge(
                    s,
                    t,
                    EdgeLabel {
                        edge_id: edge.id.clone(),
                        source_handle: edge.source_handle.clone(),
                        target_handle: edge.target_handle.clone(),
                    },
                );
            }
        }

        GraphTopology {
            graph,
            node_indices,
        }
    }

    pub fn outgoing_edges(&self, node_id: &str) -> Vec<(&str, &EdgeLabel)> {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return vec![];
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (self.graph[e.target()].as_str(), e.weight()))
            .collect()
    }

    pub fn incoming_count(&self, node_id: &str) -> usize {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return 0;
        };
        self.graph.edges_directed(idx, Direction::Incoming).count()
    }

    pub fn outgoing_count(&self, node_id: &str) -> usize {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return 0;
        };
        self.graph.edges_directed(idx, Direction::Outgoing).count()
    }

    /// Node indices reachable from any of the given entry nodes (BFS).
    pub fn reachable_from<'a>(
        &self,
        entries: impl IntoIterator<Item = &'a str>,
    ) -> HashSet<NodeIndex> {
        let mut reachable = HashSet::new();
        for entry in entries {
            let Some(&start) = self.node_indices.get(entry) else {
                continue;
            };
            let mut bfs = Bfs::new(&self.graph, start);
            while let Some(nx) = bfs.next(&self.graph) {
                reachable.insert(nx);
            }
        }
        reachable
    }
}
