//! Validation engine.
//!
//! `validate_local` is a pure function over a graph + registry; it runs the
//! id-uniqueness, edge-resolution, config, and topology passes in that order
//! and accumulates every violation found. `validate_remote` delegates to the
//! backend for authoritative confirmation when the local contract generation
//! may be stale.

pub mod config;
pub mod structural;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationIssue;
use crate::gateway::PersistenceGateway;
use crate::model::{GraphDefinition, GraphTopology};
use crate::schema::SchemaRegistry;

/// Outcome of a validation pass. Always whole, never partial: `errors` holds
/// every violation found, rendered as display strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        ValidationResult {
            valid: true,
            errors: vec![],
        }
    }

    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        ValidationResult {
            valid: issues.is_empty(),
            errors: issues.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Run every local check over the graph. Pure: no side effects, no network.
pub fn validate_local(
    definition: &GraphDefinition,
    registry: &SchemaRegistry,
) -> ValidationResult {
    let issues = collect_issues(definition, registry);
    debug!(
        graph_id = %definition.graph_id,
        issues = issues.len(),
        "local validation complete"
    );
    ValidationResult::from_issues(issues)
}

/// The issue-level form of `validate_local`, for callers that need codes.
pub fn collect_issues(
    definition: &GraphDefinition,
    registry: &SchemaRegistry,
) -> Vec<ValidationIssue> {
    let mut issues = structural::validate_structural(definition);
    issues.extend(config::validate_configs(definition, registry));

    let topology = GraphTopology::build(definition);
    issues.extend(structural::validate_topology(definition, &topology, registry));

    issues
}

/// Ask the backend to validate the graph against its own schema generation.
///
/// A transport failure degrades to an invalid result carrying the connection
/// error — it is never surfaced as an `Err`.
pub async fn validate_remote(
    definition: &GraphDefinition,
    gateway: &dyn PersistenceGateway,
) -> ValidationResult {
    match gateway.validate_graph(definition).await {
        Ok(result) => result,
        Err(e) => ValidationResult {
            valid: false,
            errors: vec![e.to_string()],
        },
    }
}
