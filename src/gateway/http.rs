//! reqwest-backed implementation of the persistence gateway.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::wire::{RawFlow, RawFlowSummary, RawProject, RawRun};
use super::{
    CreateFlowRequest, CreateProjectRequest, CreateRunRequest, GatewayError, GatewayResult,
    PersistenceGateway, UpdateFlowRequest,
};
use crate::config::GatewayConfig;
use crate::model::{Flow, FlowSummary, GraphDefinition, Health, Project, Run};
use crate::validate::ValidationResult;

pub struct HttpGateway {
    http: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(HttpGateway {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        debug!(path, "gateway GET");
        let response = self.http.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> GatewayResult<T> {
        debug!(path, "gateway POST");
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> GatewayResult<T> {
        debug!(path, "gateway PUT");
        let response = self.http.put(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    async fn delete(&self, path: &str) -> GatewayResult<()> {
        debug!(path, "gateway DELETE");
        let response = self.http.delete(self.url(path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> GatewayResult<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl PersistenceGateway for HttpGateway {
    fn create_flow(&self, req: CreateFlowRequest) -> BoxFuture<'_, GatewayResult<Flow>> {
        Box::pin(async move {
            let raw: RawFlow = self.post_json("/api/flows", &req).await?;
            raw.normalize()
        })
    }

    fn get_flow(&self, flow_id: &str) -> BoxFuture<'_, GatewayResult<Flow>> {
        let path = format!("/api/flows/{}", flow_id);
        Box::pin(async move {
            let raw: RawFlow = self.get_json(&path).await?;
            raw.normalize()
        })
    }

    fn list_flows(&self) -> BoxFuture<'_, GatewayResult<Vec<FlowSummary>>> {
        Box::pin(async move {
            let raw: Vec<RawFlowSummary> = self.get_json("/api/flows").await?;
            raw.into_iter().map(RawFlowSummary::normalize).collect()
        })
    }

    fn update_flow(
        &self,
        flow_id: &str,
        req: UpdateFlowRequest,
    ) -> BoxFuture<'_, GatewayResult<Flow>> {
        let path = format!("/api/flows/{}", flow_id);
        Box::pin(async move {
            let raw: RawFlow = self.put_json(&path, &req).await?;
            raw.normalize()
        })
    }

    fn delete_flow(&self, flow_id: &str) -> BoxFuture<'_, GatewayResult<()>> {
        let path = format!("/api/flows/{}", flow_id);
        Box::pin(async move { self.delete(&path).await })
    }

    fn create_run(&self, req: CreateRunRequest) -> BoxFuture<'_, GatewayResult<Run>> {
        Box::pin(async move {
            let raw: RawRun = self.post_json("/api/runs", &req).await?;
            raw.normalize()
        })
    }

    fn get_run(&self, run_id: &str) -> BoxFuture<'_, GatewayResult<Run>> {
        let path = format!("/api/runs/{}", run_id);
        Box::pin(async move {
            let raw: RawRun = self.get_json(&path).await?;
            raw.normalize()
        })
    }

    fn list_runs(&self, flow_id: &str) -> BoxFuture<'_, GatewayResult<Vec<Run>>> {
        let path = format!("/api/flows/{}/runs", flow_id);
        Box::pin(async move {
            let raw: Vec<RawRun> = self.get_json(&path).await?;
            raw.into_iter().map(RawRun::normalize).collect()
        })
    }

    fn cancel_run(&self, run_id: &str) -> BoxFuture<'_, GatewayResult<Run>> {
        let path = format!("/api/runs/{}/cancel", run_id);
        Box::pin(async move {
            let raw: RawRun = self.post_json(&path, &serde_json::json!({})).await?;
            raw.normalize()
        })
    }

    fn validate_graph(
        &self,
        definition: &GraphDefinition,
    ) -> BoxFuture<'_, GatewayResult<ValidationResult>> {
        let body = serde_json::json!({ "definition": definition });
        Box::pin(async move { self.post_json("/api/validate", &body).await })
    }

    fn create_project(&self, req: CreateProjectRequest) -> BoxFuture<'_, GatewayResult<Project>> {
        Box::pin(async move {
            let raw: RawProject = self.post_json("/api/projects", &req).await?;
            raw.normalize()
        })
    }

    fn get_project(&self, project_id: &str) -> BoxFuture<'_, GatewayResult<Project>> {
        let path = format!("/api/projects/{}", project_id);
        Box::pin(async move {
            let raw: RawProject = self.get_json(&path).await?;
            raw.normalize()
        })
    }

    fn list_projects(&self) -> BoxFuture<'_, GatewayResult<Vec<Project>>> {
        Box::pin(async move {
            let raw: Vec<RawProject> = self.get_json("/api/projects").await?;
            raw.into_iter().map(RawProject::normalize).collect()
        })
    }

    fn delete_project(&self, project_id: &str) -> BoxFuture<'_, GatewayResult<()>> {
        let path = format!("/api/projects/{}", project_id);
        Box::pin(async move { self.delete(&path).await })
    }

    fn health(&self) -> BoxFuture<'_, GatewayResult<Health>> {
        Box::pin(async move { self.get_json("/api/health").await })
    }
}
