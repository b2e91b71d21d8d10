//! Schema registry: maps a node's `typeId` to its configuration contract
//! and structural category.
//!
//! Dispatch is a static table from tag to checker — node configs are plain
//! JSON maps in the graph and only take typed shape here.

pub mod contracts;

use std::collections::HashMap;

use crate::error::ValidationIssue;
use crate::model::GraphNode;

/// Schema generation this build validates against. A `GraphDefinition`
/// carries the generation it was authored under (`contractVersion`); the
/// backend health check reports a mismatch when the server has moved on.
pub const CONTRACT_VERSION: u32 = 1;

/// Structural category of a node type; drives the topology rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    Trigger,
    Agent,
    Tool,
    Condition,
    Response,
}

type ConfigCheck =
    fn(&str, &serde_json::Map<String, serde_json::Value>) -> Vec<ValidationIssue>;

pub struct NodeContract {
    pub type_id: &'static str,
    pub label: &'static str,
    pub category: NodeCategory,
    check: ConfigCheck,
}

pub struct SchemaRegistry {
    contracts: HashMap<&'static str, NodeContract>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SchemaRegistry {
    /// Registry with the built-in node catalog.
    pub fn builtin() -> Self {
        let mut registry = SchemaRegistry {
            contracts: HashMap::new(),
        };
        registry.register(NodeContract {
            type_id: "trigger.manual",
            label: "Manual Trigger",
            category: NodeCategory::Trigger,
            check: contracts::check_manual_trigger,
        });
        registry.register(NodeContract {
            type_id: "trigger.webhook",
            label: "Webhook Trigger",
            category: NodeCategory::Trigger,
            check: contracts::check_webhook_trigger,
        });
        registry.register(NodeContract {
            type_id: "trigger.schedule",
            label: "Schedule Trigger",
            category: NodeCategory::Trigger,
            check: contracts::check_schedule_trigger,
        });
        registry.register(NodeContract {
            type_id: "agent.llm",
            label: "LLM Agent",
            category: NodeCategory::Agent,
            check: contracts::check_llm_agent,
        });
        registry.register(NodeContract {
            type_id: "tool.http",
            label: "HTTP Request",
            category: NodeCategory::Tool,
            check: contracts::check_http_tool,
        });
        registry.register(NodeContract {
            type_id: "tool.code",
            label: "Code",
            category: NodeCategory::Tool,
            check: contracts::check_code_tool,
        });
        registry.register(NodeContract {
            type_id: "condition.branch",
            label: "Branch",
            category: NodeCategory::Condition,
            check: contracts::check_branch_condition,
        });
        registry.register(NodeContract {
            type_id: "response.end",
            label: "End Response",
            category: NodeCategory::Response,
            check: contracts::check_end_response,
        });
        registry.register(NodeContract {
            type_id: "response.error",
            label: "Error Response",
            category: NodeCategory::Response,
            check: contracts::check_error_response,
        });
        registry
    }

    fn register(&mut self, contract: NodeContract) {
        self.contracts.insert(contract.type_id, contract);
    }

    pub fn contract(&self, type_id: &str) -> Option<&NodeContract> {
        self.contracts.get(type_id)
    }

    pub fn category(&self, type_id: &str) -> Option<NodeCategory> {
        self.contracts.get(type_id).map(|c| c.category)
    }

    pub fn label(&self, type_id: &str) -> Option<&'static str> {
        self.contracts.get(type_id).map(|c| c.label)
    }

    pub fn type_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.contracts.keys().copied()
    }

    /// Check one node's config against its registered contract.
    /// An unregistered `typeId` is an error, not a panic.
    pub fn check_node(&self, node: &GraphNode) -> Vec<ValidationIssue> {
        match self.contracts.get(node.type_id.as_str()) {
            Some(contract) => (contract.check)(&node.id, &node.config),
            None => vec![ValidationIssue::config(
                "N001",
                format!("Unknown node type '{}'", node.type_id),
                Some(node.id.clone()),
            )],
        }
    }
}
