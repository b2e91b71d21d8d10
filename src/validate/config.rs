//! Per-node configuration validation, dispatched through the schema registry.

use crate::error::ValidationIssue;
use crate::model::GraphDefinition;
use crate::schema::SchemaRegistry;

/// Check every node's config against its registered contract.
/// All findings are accumulated; nothing short-circuits.
pub fn validate_configs(
    definition: &GraphDefinition,
    registry: &SchemaRegistry,
) -> Vec<ValidationIssue> {
    let mut errors = Vec::new();
    for node in &definition.nodes {
        errors.extend(registry.check_node(node));
    }
    errors
}
