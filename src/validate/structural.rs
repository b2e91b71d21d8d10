//! Graph-level structural rules (V001–V005) and topology rules (T001–T005).

use std::collections::HashSet;

use crate::error::ValidationIssue;
use crate::model::{GraphDefinition, GraphTopology};
use crate::schema::{NodeCategory, SchemaRegistry};

/// Run the structural rules in order. Returns all errors found.
pub fn validate_structural(definition: &GraphDefinition) -> Vec<ValidationIssue> {
    let mut errors = Vec::new();

    v001_non_empty(definition, &mut errors);
    v002_unique_node_ids(definition, &mut errors);
    v003_edges_reference_existing_nodes(definition, &mut errors);
    v004_no_duplicate_edges(definition, &mut errors);
    v005_no_self_loops(definition, &mut errors);

    errors
}

/// Run the topology rules. Categories come from the registry; nodes with an
/// unregistered type are skipped here (the config pass already flags them).
pub fn validate_topology(
    definition: &GraphDefinition,
    topology: &GraphTopology,
    registry: &SchemaRegistry,
) -> Vec<ValidationIssue> {
    let mut errors = Vec::new();
    if definition.nodes.is_empty() {
        // V001 already covers the empty graph.
        return errors;
    }

    t001_has_trigger(definition, registry, &mut errors);
    t002_trigger_no_incoming(definition, topology, registry, &mut errors);
    t003_response_no_outgoing(definition, topology, registry, &mut errors);
    t004_all_reachable_from_triggers(definition, topology, registry, &mut errors);
    t005_condition_branch_handles(definition, topology, registry, &mut errors);

    errors
}

fn v001_non_empty(definition: &GraphDefinition, errors: &mut Vec<ValidationIssue>) {
    if definition.nodes.is_empty() {
        errors.push(ValidationIssue::structural(
            "V001",
            "Graph is empty: a flow needs at least a trigger and a response",
            None,
        ));
    }
}

fn v002_unique_node_ids(definition: &GraphDefinition, errors: &mut Vec<ValidationIssue>) {
    let mut seen = HashSet::new();
    for node in &definition.nodes {
        if !seen.insert(node.id.as_str()) {
            errors.push(ValidationIssue::structural(
                "V002",
                format!("Duplicate node id '{}'", node.id),
                Some(node.id.clone()),
            ));
        }
    }
}

fn v003_edges_reference_existing_nodes(
    definition: &GraphDefinition,
    errors: &mut Vec<ValidationIssue>,
) {
    let node_ids: HashSet<&str> = definition.nodes.iter().map(|n| n.id.as_str()).collect();
    for edge in &definition.edges {
        if !node_ids.contains(edge.source.as_str()) {
            errors.push(ValidationIssue::structural(
                "V003",
                format!(
                    "Edge '{}' references unknown source node '{}'",
                    edge.id, edge.source
                ),
                None,
            ));
        }
        if !node_ids.contains(edge.target.as_str()) {
            errors.push(ValidationIssue::structural(
                "V003",
                format!(
                    "Edge '{}' references unknown target node '{}'",
                    edge.id, edge.target
                ),
                None,
            ));
        }
    }
}

fn v004_no_duplicate_edges(definition: &GraphDefinition, errors: &mut Vec<ValidationIssue>) {
    let mut seen = HashSet::new();
    for edge in &definition.edges {
        let key = (
            edge.source.clone(),
            edge.target.clone(),
            edge.source_handle.clone(),
            edge.target_handle.clone(),
        );
        if !seen.insert(key) {
            errors.push(ValidationIssue::structural(
                "V004",
                format!("Duplicate edge from '{}' to '{}'", edge.source, edge.target),
                None,
            ));
        }
    }
}

fn v005_no_self_loops(definition: &GraphDefinition, errors: &mut Vec<ValidationIssue>) {
    for edge in &definition.edges {
        if edge.source == edge.target {
            errors.push(ValidationIssue::structural(
                "V005",
                format!("Self-loop detected on node '{}'", edge.source),
                Some(edge.source.clone()),
            ));
        }
    }
}

fn trigger_ids<'a>(definition: &'a GraphDefinition, registry: &SchemaRegistry) -> Vec<&'a str> {
    definition
        .nodes
        .iter()
        .filter(|n| registry.category(&n.type_id) == Some(NodeCategory::Trigger))
        .map(|n| n.id.as_str())
        .collect()
}

fn t001_has_trigger(
    definition: &GraphDefinition,
    registry: &SchemaRegistry,
    errors: &mut Vec<ValidationIssue>,
) {
    if trigger_ids(definition, registry).is_empty() {
        errors.push(ValidationIssue::topology(
            "T001",
            "Flow has no entry point: at least one trigger node is required",
            None,
        ));
    }
}

fn t002_trigger_no_incoming(
    definition: &GraphDefinition,
    topology: &GraphTopology,
    registry: &SchemaRegistry,
    errors: &mut Vec<ValidationIssue>,
) {
    for id in trigger_ids(definition, registry) {
        if topology.incoming_count(id) > 0 {
            errors.push(ValidationIssue::topology(
                "T002",
                format!("Trigger node '{}' must not have incoming edges", id),
                Some(id.to_string()),
            ));
        }
    }
}

fn t003_response_no_outgoing(
    definition: &GraphDefinition,
    topology: &GraphTopology,
    registry: &SchemaRegistry,
    errors: &mut Vec<ValidationIssue>,
) {
    for node in &definition.nodes {
        if registry.category(&node.type_id) == Some(NodeCategory::Response)
            && topology.outgoing_count(&node.id) > 0
        {
            errors.push(ValidationIssue::topology(
                "T003",
                format!("Response node '{}' must not have outgoing edges", node.id),
                Some(node.id.clone()),
            ));
        }
    }
}

fn t004_all_reachable_from_triggers(
    definition: &GraphDefinition,
    topology: &GraphTopology,
    registry: &SchemaRegistry,
    errors: &mut Vec<ValidationIssue>,
) {
    let triggers = trigger_ids(definition, registry);
    if triggers.is_empty() {
        return;
    }

    let reachable = topology.reachable_from(triggers);
    for node in &definition.nodes {
        let Some(&idx) = topology.node_indices.get(&node.id) else {
            continue;
        };
        if !reachable.contains(&idx) {
            errors.push(ValidationIssue::topology(
                "T004",
                format!("Node '{}' is not reachable from any trigger", node.id),
                Some(node.id.clone()),
            ));
        }
    }
}

fn t005_condition_branch_handles(
    definition: &GraphDefinition,
    topology: &GraphTopology,
    registry: &SchemaRegistry,
    errors: &mut Vec<ValidationIssue>,
) {
    for node in &definition.nodes {
        if registry.category(&node.type_id) != Some(NodeCategory::Condition) {
            continue;
        }
        let edges = topology.outgoing_edges(&node.id);
        if edges.len() != 2 {
            errors.push(ValidationIssue::topology(
                "T005",
                format!(
                    "Condition node '{}' must have exactly 2 outgoing edges (true/false), found {}",
                    node.id,
                    edges.len()
                ),
                Some(node.id.clone()),
            ));
            continue;
        }

        let handles: HashSet<Option<&str>> = edges
            .iter()
            .map(|(_, label)| label.source_handle.as_deref())
            .collect();
        if !handles.contains(&Some("true")) || !handles.contains(&Some("false")) {
            errors.push(ValidationIssue::topology(
                "T005",
                format!(
                    "Condition node '{}' outgoing edges must have sourceHandle 'true' and 'false'",
                    node.id
                ),
                Some(node.id.clone()),
            ));
        }
    }
}
