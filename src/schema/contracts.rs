//! Typed configuration contracts for the built-in node catalog.
//!
//! Each node `typeId` maps to one config struct here; the registry
//! deserializes a node's raw `config` map against it and then applies the
//! matching field rules. Unknown keys are rejected so stale fields from an
//! older schema generation surface as errors instead of being dropped.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationIssue;

pub(super) const VALID_HTTP_METHODS: [&str; 6] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD"];

// =============================================================================
// TRIGGERS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ManualTriggerConfig {
    /// Example payload shown in the editor when test-running the flow.
    #[serde(default)]
    pub input_example: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WebhookTriggerConfig {
    pub http_method: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub secret_header: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScheduleTriggerConfig {
    pub schedule: String,
    #[serde(default)]
    pub timezone: Option<String>,
}

// =============================================================================
// AGENTS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LlmAgentConfig {
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub system_prompt: String,
    pub user_prompt: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Tool node ids this agent may call (empty = none).
    #[serde(default)]
    pub tools: Vec<String>,
}

// =============================================================================
// TOOLS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpToolConfig {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CodeToolConfig {
    pub language: String,
    pub code: String,
    #[serde(default)]
    pub timeout_ms: Option<u32>,
}

// =============================================================================
// CONTROL FLOW
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BranchConditionConfig {
    pub conditions: Vec<Condition>,
    pub combine_with: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Condition {
    pub field: String,
    pub operator: String,
    #[serde(default)]
    pub value: Option<String>,
}

pub(super) const VALID_OPERATORS: [&str; 6] =
    ["equals", "notEquals", "contains", "greaterThan", "lessThan", "exists"];

// =============================================================================
// RESPONSES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EndResponseConfig {
    pub output_template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ErrorResponseConfig {
    pub error_message: String,
}

// =============================================================================
// FIELD RULES — one function per contract, all findings accumulated
// =============================================================================

type ConfigMap = serde_json::Map<String, serde_json::Value>;

fn decode<T: serde::de::DeserializeOwned>(
    code: &str,
    node_id: &str,
    config: &ConfigMap,
) -> Result<T, Vec<ValidationIssue>> {
    serde_json::from_value(serde_json::Value::Object(config.clone())).map_err(|e| {
        vec![ValidationIssue::config(
            code,
            format!("Config does not match the contract: {}", e),
            Some(node_id.to_string()),
        )]
    })
}

pub(super) fn check_manual_trigger(node_id: &str, config: &ConfigMap) -> Vec<ValidationIssue> {
    match decode::<ManualTriggerConfig>("N002", node_id, config) {
        Ok(_) => vec![],
        Err(errors) => errors,
    }
}

pub(super) fn check_schedule_trigger(node_id: &str, config: &ConfigMap) -> Vec<ValidationIssue> {
    let cfg = match decode::<ScheduleTriggerConfig>("N002", node_id, config) {
        Ok(c) => c,
        Err(errors) => return errors,
    };
    let mut errors = Vec::new();
    if cfg.schedule.trim().is_empty() {
        errors.push(ValidationIssue::config(
            "N003",
            "Schedule trigger cron expression must not be empty",
            Some(node_id.to_string()),
        ));
    }
    errors
}

pub(super) fn check_webhook_trigger(node_id: &str, config: &ConfigMap) -> Vec<ValidationIssue> {
    let cfg = match decode::<WebhookTriggerConfig>("N002", node_id, config) {
        Ok(c) => c,
        Err(errors) => return errors,
    };
    let mut errors = Vec::new();
    if !VALID_HTTP_METHODS.contains(&cfg.http_method.as_str()) {
        errors.push(ValidationIssue::config(
            "N004",
            format!("Invalid HTTP method '{}'", cfg.http_method),
            Some(node_id.to_string()),
        ));
    }
    errors
}

pub(super) fn check_llm_agent(node_id: &str, config: &ConfigMap) -> Vec<ValidationIssue> {
    let cfg = match decode::<LlmAgentConfig>("N002", node_id, config) {
        Ok(c) => c,
        Err(errors) => return errors,
    };
    let mut errors = Vec::new();
    if cfg.provider.trim().is_empty() {
        errors.push(ValidationIssue::config(
            "N005",
            "Agent provider must not be empty",
            Some(node_id.to_string()),
        ));
    }
    if cfg.model.trim().is_empty() {
        errors.push(ValidationIssue::config(
            "N005",
            "Agent model must not be empty",
            Some(node_id.to_string()),
        ));
    }
    if cfg.user_prompt.trim().is_empty() {
        errors.push(ValidationIssue::config(
            "N005",
            "Agent user prompt must not be empty",
            Some(node_id.to_string()),
        ));
    }
    if let Some(t) = cfg.temperature {
        if !(0.0..=2.0).contains(&t) {
            errors.push(ValidationIssue::config(
                "N005",
                format!("Agent temperature {} is outside the 0.0–2.0 range", t),
                Some(node_id.to_string()),
            ));
        }
    }
    if cfg.max_tokens == Some(0) {
        errors.push(ValidationIssue::config(
            "N005",
            "Agent max tokens must be greater than zero",
            Some(node_id.to_string()),
        ));
    }
    errors
}

pub(super) fn check_http_tool(node_id: &str, config: &ConfigMap) -> Vec<ValidationIssue> {
    let cfg = match decode::<HttpToolConfig>("N002", node_id, config) {
        Ok(c) => c,
        Err(errors) => return errors,
    };
    let mut errors = Vec::new();
    if cfg.url.trim().is_empty() {
        errors.push(ValidationIssue::config(
            "N006",
            "HTTP tool URL must not be empty",
            Some(node_id.to_string()),
        ));
    }
    if !VALID_HTTP_METHODS.contains(&cfg.method.as_str()) {
        errors.push(ValidationIssue::config(
            "N006",
            format!("Invalid HTTP method '{}'", cfg.method),
            Some(node_id.to_string()),
        ));
    }
    errors
}

pub(super) fn check_code_tool(node_id: &str, config: &ConfigMap) -> Vec<ValidationIssue> {
    let cfg = match decode::<CodeToolConfig>("N002", node_id, config) {
        Ok(c) => c,
        Err(errors) => return errors,
    };
    let mut errors = Vec::new();
    if cfg.code.trim().is_empty() {
        errors.push(ValidationIssue::config(
            "N007",
            "Code tool must have non-empty code",
            Some(node_id.to_string()),
        ));
    }
    if !["javascript", "python"].contains(&cfg.language.as_str()) {
        errors.push(ValidationIssue::config(
            "N007",
            format!("Unsupported code language '{}'", cfg.language),
            Some(node_id.to_string()),
        ));
    }
    errors
}

pub(super) fn check_branch_condition(node_id: &str, config: &ConfigMap) -> Vec<ValidationIssue> {
    let cfg = match decode::<BranchConditionConfig>("N002", node_id, config) {
        Ok(c) => c,
        Err(errors) => return errors,
    };
    let mut errors = Vec::new();
    if cfg.conditions.is_empty() {
        errors.push(ValidationIssue::config(
            "N008",
            "Condition node must have at least one condition",
            Some(node_id.to_string()),
        ));
    }
    if !["and", "or"].contains(&cfg.combine_with.as_str()) {
        errors.push(ValidationIssue::config(
            "N008",
            format!("Invalid combinator '{}', expected 'and' or 'or'", cfg.combine_with),
            Some(node_id.to_string()),
        ));
    }
    for condition in &cfg.conditions {
        if !VALID_OPERATORS.contains(&condition.operator.as_str()) {
            errors.push(ValidationIssue::config(
                "N008",
                format!("Unknown condition operator '{}'", condition.operator),
                Some(node_id.to_string()),
            ));
        }
        if condition.field.trim().is_empty() {
            errors.push(ValidationIssue::config(
                "N008",
                "Condition field must not be empty",
                Some(node_id.to_string()),
            ));
        }
    }
    errors
}

pub(super) fn check_end_response(node_id: &str, config: &ConfigMap) -> Vec<ValidationIssue> {
    let cfg = match decode::<EndResponseConfig>("N002", node_id, config) {
        Ok(c) => c,
        Err(errors) => return errors,
    };
    let mut errors = Vec::new();
    if cfg.output_template.trim().is_empty() {
        errors.push(ValidationIssue::config(
            "N009",
            "Response output template must not be empty",
            Some(node_id.to_string()),
        ));
    }
    errors
}

pub(super) fn check_error_response(node_id: &str, config: &ConfigMap) -> Vec<ValidationIssue> {
    let cfg = match decode::<ErrorResponseConfig>("N002", node_id, config) {
        Ok(c) => c,
        Err(errors) => return errors,
    };
    let mut errors = Vec::new();
    if cfg.error_message.trim().is_empty() {
        errors.push(ValidationIssue::config(
            "N010",
            "Error response message must not be empty",
            Some(node_id.to_string()),
        ));
    }
    errors
}
