//! Raw backend payloads and their normalization.
//!
//! The backend is loose about field naming: a flow id may arrive as `id`,
//! `flow_id`, or `flowId` depending on the endpoint generation. All of that
//! tolerance lives here, once; the rest of the crate only ever sees the
//! canonical `Flow` / `Run` types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{GatewayError, GatewayResult};
use crate::model::{
    Flow, FlowSummary, GraphDefinition, NodeRunStatus, Project, Run, RunStatus, TraceEntry,
};

#[derive(Debug, Deserialize)]
pub struct RawFlow {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "flowId")]
    pub flow_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "graph")]
    pub definition: Option<GraphDefinition>,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl RawFlow {
    pub fn normalize(self) -> GatewayResult<Flow> {
        let id = self
            .id
            .or(self.flow_id)
            .ok_or_else(|| GatewayError::Payload("flow payload carries no id".into()))?;
        let definition = self
            .definition
            .ok_or_else(|| GatewayError::Payload("flow payload carries no definition".into()))?;
        Ok(Flow {
            id,
            name: self.name,
            description: self.description,
            definition,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RawFlowSummary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "flowId")]
    pub flow_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl RawFlowSummary {
    pub fn normalize(self) -> GatewayResult<FlowSummary> {
        let id = self
            .id
            .or(self.flow_id)
            .ok_or_else(|| GatewayError::Payload("flow payload carries no id".into()))?;
        Ok(FlowSummary {
            id,
            name: self.name,
            description: self.description,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTraceEntry {
    #[serde(alias = "node_id")]
    pub node_id: String,
    pub status: NodeRunStatus,
    #[serde(default)]
    pub input: Option<serde_json::Value>,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(alias = "started_at")]
    pub started_at: DateTime<Utc>,
    #[serde(default, alias = "ended_at")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "duration_ms")]
    pub duration_ms: u64,
}

impl From<RawTraceEntry> for TraceEntry {
    fn from(raw: RawTraceEntry) -> Self {
        TraceEntry {
            node_id: raw.node_id,
            status: raw.status,
            input: raw.input,
            output: raw.output,
            error: raw.error,
            started_at: raw.started_at,
            ended_at: raw.ended_at,
            duration_ms: raw.duration_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawRun {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "runId")]
    pub run_id: Option<String>,
    #[serde(default, alias = "flowId", alias = "flow_id")]
    pub flow: Option<String>,
    pub status: RunStatus,
    #[serde(default)]
    pub trace: Vec<RawTraceEntry>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, alias = "graph")]
    pub definition: Option<GraphDefinition>,
    #[serde(alias = "startedAt", alias = "created_at", alias = "createdAt")]
    pub started_at: DateTime<Utc>,
    #[serde(default, alias = "endedAt")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl RawRun {
    pub fn normalize(self) -> GatewayResult<Run> {
        let id = self
            .id
            .or(self.run_id)
            .ok_or_else(|| GatewayError::Payload("run payload carries no id".into()))?;
        let flow_id = self
            .flow
            .ok_or_else(|| GatewayError::Payload("run payload carries no flow id".into()))?;
        Ok(Run {
            id,
            flow_id,
            status: self.status,
            trace: self.trace.into_iter().map(TraceEntry::from).collect(),
            error: self.error,
            definition: self.definition,
            started_at: self.started_at,
            ended_at: self.ended_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RawProject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "projectId")]
    pub project_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl RawProject {
    pub fn normalize(self) -> GatewayResult<Project> {
        let id = self
            .id
            .or(self.project_id)
            .ok_or_else(|| GatewayError::Payload("project payload carries no id".into()))?;
        Ok(Project {
            id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
        })
    }
}
