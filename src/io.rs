//! Import/export: the canonical JSON wire form of a graph.
//!
//! The wire shape carries only `graphId`, `contractVersion`, and the node
//! `{id, typeId, version, config}` / edge `{id, source, target,
//! sourceHandle?, targetHandle?}` sets. Editor-local state (display names,
//! run statuses, canvas positions) never round-trips.

use crate::error::ValidationIssue;
use crate::model::GraphDefinition;

/// Serialize a graph to its canonical JSON string.
pub fn export_graph(definition: &GraphDefinition) -> String {
    // GraphDefinition's serde form is exactly the wire shape; field order is
    // fixed by the struct, so the output is stable for a given graph.
    serde_json::to_string(definition).unwrap_or_else(|_| String::from("{}"))
}

/// Deserialize a graph from its JSON wire form.
pub fn parse_graph(json: &str) -> Result<GraphDefinition, Vec<ValidationIssue>> {
    let mut definition: GraphDefinition = serde_json::from_str(json).map_err(|e| {
        vec![ValidationIssue::parse(
            "P001",
            format!("Failed to parse graph JSON: {}", e),
        )]
    })?;

    // Wire nodes carry no display name; seed one from the type id so the
    // editor always has something to render.
    for node in &mut definition.nodes {
        if node.display_name.is_empty() {
            node.display_name = node.type_id.clone();
        }
    }

    Ok(definition)
}
