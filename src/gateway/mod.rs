//! Persistence gateway: the backend contract consumed by the core.
//!
//! The backend is external — this module defines the typed contract
//! (`PersistenceGateway`), the transport error taxonomy, and the HTTP
//! implementation. Everything crossing this boundary is normalized into the
//! canonical `Flow` / `Run` types; no downstream code ever branches on which
//! duck-typed key a payload happened to carry.

pub mod http;
pub mod wire;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    ConnectionStatus, Flow, FlowSummary, GraphDefinition, Health, Project, Run,
};
use crate::validate::ValidationResult;

pub use http::HttpGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Backend unreachable or the request never completed. User-retryable.
    #[error("connection error: {0}")]
    Transport(String),

    /// Backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Backend answered 2xx but the payload did not normalize.
    #[error("malformed backend payload: {0}")]
    Payload(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Payload(e.to_string())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

// =============================================================================
// REQUEST BODIES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlowRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub definition: GraphDefinition,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFlowRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<GraphDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRunRequest {
    pub flow_id: String,
    pub definition: GraphDefinition,
    /// Forwarded to the backend; the client enforces no timeout of its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// =============================================================================
// CONTRACT
// =============================================================================

/// Typed contract against the backend. Object-safe so the orchestrator and
/// tests can swap implementations behind `Arc<dyn PersistenceGateway>`.
pub trait PersistenceGateway: Send + Sync + 'static {
    // Flows
    fn create_flow(&self, req: CreateFlowRequest) -> BoxFuture<'_, GatewayResult<Flow>>;
    fn get_flow(&self, flow_id: &str) -> BoxFuture<'_, GatewayResult<Flow>>;
    fn list_flows(&self) -> BoxFuture<'_, GatewayResult<Vec<FlowSummary>>>;
    fn update_flow(
        &self,
        flow_id: &str,
        req: UpdateFlowRequest,
    ) -> BoxFuture<'_, GatewayResult<Flow>>;
    fn delete_flow(&self, flow_id: &str) -> BoxFuture<'_, GatewayResult<()>>;

    // Runs
    fn create_run(&self, req: CreateRunRequest) -> BoxFuture<'_, GatewayResult<Run>>;
    fn get_run(&self, run_id: &str) -> BoxFuture<'_, GatewayResult<Run>>;
    fn list_runs(&self, flow_id: &str) -> BoxFuture<'_, GatewayResult<Vec<Run>>>;
    fn cancel_run(&self, run_id: &str) -> BoxFuture<'_, GatewayResult<Run>>;

    // Validation
    fn validate_graph(
        &self,
        definition: &GraphDefinition,
    ) -> BoxFuture<'_, GatewayResult<ValidationResult>>;

    // Projects
    fn create_project(&self, req: CreateProjectRequest) -> BoxFuture<'_, GatewayResult<Project>>;
    fn get_project(&self, project_id: &str) -> BoxFuture<'_, GatewayResult<Project>>;
    fn list_projects(&self) -> BoxFuture<'_, GatewayResult<Vec<Project>>>;
    fn delete_project(&self, project_id: &str) -> BoxFuture<'_, GatewayResult<()>>;

    // Health
    fn health(&self) -> BoxFuture<'_, GatewayResult<Health>>;
}

/// Health probe that degrades instead of failing: an unreachable backend is
/// an `Offline` status, not an error.
pub async fn probe_health(gateway: &dyn PersistenceGateway) -> Health {
    match gateway.health().await {
        Ok(health) => health,
        Err(_) => Health {
            status: ConnectionStatus::Offline,
            version: None,
        },
    }
}
