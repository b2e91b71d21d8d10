//! Integration tests for graph store mutation semantics.

mod helpers;

use std::sync::Arc;

use helpers::*;
use serde_json::json;
use studio_core::model::{GraphNode, NodeRunStatus};
use studio_core::store::GraphStore;

#[test]
fn remove_node_cascades_touching_edges() {
    let store = GraphStore::from_definition(graph(
        vec![trigger_node("t1"), agent_node("a1"), response_node("r1")],
        vec![
            edge("e1", "t1", "a1"),
            edge("e2", "a1", "r1"),
            edge("e3", "t1", "r1"),
        ],
    ));

    store.remove_node("a1");

    let definition = store.definition();
    assert!(definition.node("a1").is_none());
    assert!(
        definition
            .edges
            .iter()
            .all(|e| e.source != "a1" && e.target != "a1"),
        "no edge may reference the removed node"
    );
    // The untouched edge survives.
    assert!(definition.edge("e3").is_some());
    assert_eq!(definition.edges.len(), 1);
}

#[test]
fn upsert_inserts_then_replaces_without_touching_edges() {
    let store = GraphStore::from_definition(two_node_graph());

    store.upsert_node(agent_node("a1"));
    assert!(store.definition().node("a1").is_some());

    let replacement = GraphNode::new("a1", "agent.llm").with_config(config(json!({
        "provider": "anthropic",
        "model": "claude-haiku-4-5",
        "userPrompt": "Shorter now"
    })));
    store.upsert_node(replacement);

    let definition = store.definition();
    assert_eq!(definition.nodes.iter().filter(|n| n.id == "a1").count(), 1);
    assert_eq!(
        definition.node("a1").unwrap().config["model"],
        json!("claude-haiku-4-5")
    );
    // Edges were never part of the operation.
    assert_eq!(definition.edges.len(), 1);
}

#[test]
fn update_node_config_shallow_merges_preserving_unspecified_keys() {
    let store = GraphStore::from_definition(graph(vec![agent_node("a1")], vec![]));

    store.update_node_config("a1", config(json!({ "temperature": 0.9 })));

    let definition = store.definition();
    let cfg = &definition.node("a1").unwrap().config;
    assert_eq!(cfg["temperature"], json!(0.9));
    assert_eq!(cfg["model"], json!("claude-sonnet-4-5"));
    assert_eq!(cfg["userPrompt"], json!("Summarize {{input}}"));
}

#[test]
fn update_node_config_on_unknown_node_is_a_silent_noop() {
    let store = GraphStore::from_definition(two_node_graph());
    let before = store.nodes();

    store.update_node_config("nope", config(json!({ "x": 1 })));

    // Nothing changed — not even the collection identity.
    assert!(Arc::ptr_eq(&before, &store.nodes()));
}

#[test]
fn update_nodes_applies_pure_transform() {
    let store = GraphStore::from_definition(two_node_graph());

    store.update_nodes(|nodes| {
        nodes
            .iter()
            .cloned()
            .map(|mut n| {
                n.display_name = n.display_name.to_uppercase();
                n
            })
            .collect()
    });

    let nodes = store.nodes();
    assert!(nodes.iter().all(|n| n.display_name.chars().all(|c| !c.is_lowercase())));
    assert_eq!(nodes.len(), 2);
}

#[test]
fn mutations_replace_collection_identity_for_observers() {
    let store = GraphStore::from_definition(two_node_graph());

    let nodes_before = store.nodes();
    let edges_before = store.edges();

    // An edge-only mutation leaves the node collection untouched, so an
    // observer can skip re-rendering nodes entirely.
    store.add_edge(edge("e2", "t1", "r1"));
    assert!(Arc::ptr_eq(&nodes_before, &store.nodes()));
    assert!(!Arc::ptr_eq(&edges_before, &store.edges()));

    let nodes_after = store.nodes();
    store.set_node_status("t1", NodeRunStatus::Running);
    assert!(!Arc::ptr_eq(&nodes_after, &store.nodes()));
}

#[test]
fn remove_edge_only_touches_that_edge() {
    let store = GraphStore::from_definition(graph(
        vec![trigger_node("t1"), response_node("r1")],
        vec![edge("e1", "t1", "r1"), edge("e2", "t1", "r1")],
    ));

    store.remove_edge("e1");

    let definition = store.definition();
    assert!(definition.edge("e1").is_none());
    assert!(definition.edge("e2").is_some());
    assert_eq!(definition.nodes.len(), 2);
}

#[test]
fn apply_trace_folds_statuses_and_skips_unknown_nodes() {
    let store = GraphStore::from_definition(two_node_graph());

    store.apply_trace(&[
        trace_entry("t1", NodeRunStatus::Success),
        trace_entry("r1", NodeRunStatus::Error),
        trace_entry("gone", NodeRunStatus::Success),
    ]);

    let definition = store.definition();
    assert_eq!(definition.node("t1").unwrap().status, NodeRunStatus::Success);
    assert_eq!(definition.node("r1").unwrap().status, NodeRunStatus::Error);

    store.reset_statuses();
    let definition = store.definition();
    assert!(definition.nodes.iter().all(|n| n.status == NodeRunStatus::Idle));
}
