#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use futures::future::BoxFuture;
use serde_json::json;

use studio_core::gateway::{
    CreateFlowRequest, CreateProjectRequest, CreateRunRequest, GatewayError, GatewayResult,
    PersistenceGateway, UpdateFlowRequest,
};
use studio_core::model::{
    ConnectionStatus, Flow, FlowSummary, GraphDefinition, GraphEdge, GraphNode, Health,
    NodeRunStatus, Project, Run, RunStatus, TraceEntry,
};
use studio_core::schema::CONTRACT_VERSION;
use studio_core::validate::ValidationResult;

// =============================================================================
// Graph builders
// =============================================================================

pub fn config(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        _ => panic!("test configs are objects"),
    }
}

pub fn trigger_node(id: &str) -> GraphNode {
    GraphNode::new(id, "trigger.manual")
}

pub fn agent_node(id: &str) -> GraphNode {
    GraphNode::new(id, "agent.llm").with_config(config(json!({
        "provider": "anthropic",
        "model": "claude-sonnet-4-5",
        "userPrompt": "Summarize {{input}}"
    })))
}

pub fn http_tool_node(id: &str) -> GraphNode {
    GraphNode::new(id, "tool.http").with_config(config(json!({
        "method": "GET",
        "url": "https://api.example.com/items"
    })))
}

pub fn response_node(id: &str) -> GraphNode {
    GraphNode::new(id, "response.end").with_config(config(json!({
        "outputTemplate": "{{output}}"
    })))
}

pub fn edge(id: &str, source: &str, target: &str) -> GraphEdge {
    GraphEdge::new(id, source, target)
}

pub fn graph(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> GraphDefinition {
    GraphDefinition {
        graph_id: "test-graph".into(),
        contract_version: CONTRACT_VERSION,
        nodes,
        edges,
    }
}

/// The canonical two-node flow: manual trigger `t1` wired to end response
/// `r1` by edge `e1`.
pub fn two_node_graph() -> GraphDefinition {
    graph(
        vec![trigger_node("t1"), response_node("r1")],
        vec![edge("e1", "t1", "r1")],
    )
}

pub fn make_run(id: &str, status: RunStatus) -> Run {
    Run {
        id: id.into(),
        flow_id: "test-graph".into(),
        status,
        trace: vec![],
        error: None,
        definition: None,
        started_at: Utc::now(),
        ended_at: None,
    }
}

pub fn trace_entry(node_id: &str, status: NodeRunStatus) -> TraceEntry {
    TraceEntry {
        node_id: node_id.into(),
        status,
        input: None,
        output: None,
        error: None,
        started_at: Utc::now(),
        ended_at: Some(Utc::now()),
        duration_ms: 5,
    }
}

// =============================================================================
// Call-counting gateway double
// =============================================================================

/// How the mock answers `cancel_run`.
pub enum CancelScript {
    /// Acknowledge with a cancelled run.
    Cancelled,
    /// Reject with a 409: the run already finished server-side.
    Conflict,
    /// Fail transport-level.
    Unreachable,
}

/// Scripted in-memory gateway. `get_run` answers from a queue of statuses
/// (the last one repeats once the queue drains) and every endpoint counts
/// its calls, so tests can assert fail-fast and polling-termination
/// behavior.
pub struct MockGateway {
    pub create_run_calls: AtomicUsize,
    pub get_run_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
    pub validate_calls: AtomicUsize,
    statuses: Mutex<VecDeque<RunStatus>>,
    last_status: Mutex<RunStatus>,
    final_trace: Mutex<Vec<TraceEntry>>,
    seeded_runs: Mutex<HashMap<String, Run>>,
    cancel_script: Mutex<CancelScript>,
    next_run_id: Mutex<String>,
}

impl MockGateway {
    pub fn new() -> Self {
        MockGateway {
            create_run_calls: AtomicUsize::new(0),
            get_run_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
            validate_calls: AtomicUsize::new(0),
            statuses: Mutex::new(VecDeque::new()),
            last_status: Mutex::new(RunStatus::Pending),
            final_trace: Mutex::new(vec![]),
            seeded_runs: Mutex::new(HashMap::new()),
            cancel_script: Mutex::new(CancelScript::Cancelled),
            next_run_id: Mutex::new("run-1".into()),
        }
    }

    /// Queue the statuses successive `get_run` calls will report.
    pub fn script_statuses(&self, statuses: &[RunStatus]) {
        let mut queue = self.statuses.lock().unwrap();
        queue.clear();
        queue.extend(statuses.iter().copied());
    }

    /// Trace attached once a scripted status is terminal.
    pub fn set_final_trace(&self, trace: Vec<TraceEntry>) {
        *self.final_trace.lock().unwrap() = trace;
    }

    pub fn seed_run(&self, run: Run) {
        self.seeded_runs.lock().unwrap().insert(run.id.clone(), run);
    }

    pub fn set_cancel_script(&self, script: CancelScript) {
        *self.cancel_script.lock().unwrap() = script;
    }

    pub fn set_next_run_id(&self, id: &str) {
        *self.next_run_id.lock().unwrap() = id.to_string();
    }

    fn next_status(&self) -> RunStatus {
        let mut queue = self.statuses.lock().unwrap();
        match queue.pop_front() {
            Some(status) => {
                *self.last_status.lock().unwrap() = status;
                status
            }
            None => *self.last_status.lock().unwrap(),
        }
    }

    fn build_run(&self, run_id: &str, status: RunStatus) -> Run {
        let mut run = make_run(run_id, status);
        if status.is_terminal() {
            run.trace = self.final_trace.lock().unwrap().clone();
            run.ended_at = Some(Utc::now());
        }
        run
    }
}

impl PersistenceGateway for MockGateway {
    fn create_flow(&self, _req: CreateFlowRequest) -> BoxFuture<'_, GatewayResult<Flow>> {
        Box::pin(async { Err(GatewayError::Transport("mock: flows unsupported".into())) })
    }

    fn get_flow(&self, _flow_id: &str) -> BoxFuture<'_, GatewayResult<Flow>> {
        Box::pin(async { Err(GatewayError::Transport("mock: flows unsupported".into())) })
    }

    fn list_flows(&self) -> BoxFuture<'_, GatewayResult<Vec<FlowSummary>>> {
        Box::pin(async { Ok(vec![]) })
    }

    fn update_flow(
        &self,
        _flow_id: &str,
        _req: UpdateFlowRequest,
    ) -> BoxFuture<'_, GatewayResult<Flow>> {
        Box::pin(async { Err(GatewayError::Transport("mock: flows unsupported".into())) })
    }

    fn delete_flow(&self, _flow_id: &str) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn create_run(&self, req: CreateRunRequest) -> BoxFuture<'_, GatewayResult<Run>> {
        self.create_run_calls.fetch_add(1, Ordering::SeqCst);
        let run_id = self.next_run_id.lock().unwrap().clone();
        let mut run = make_run(&run_id, RunStatus::Pending);
        run.flow_id = req.flow_id;
        Box::pin(async move { Ok(run) })
    }

    fn get_run(&self, run_id: &str) -> BoxFuture<'_, GatewayResult<Run>> {
        self.get_run_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(seeded) = self.seeded_runs.lock().unwrap().get(run_id) {
            let run = seeded.clone();
            return Box::pin(async move { Ok(run) });
        }
        let run = self.build_run(run_id, self.next_status());
        Box::pin(async move { Ok(run) })
    }

    fn list_runs(&self, _flow_id: &str) -> BoxFuture<'_, GatewayResult<Vec<Run>>> {
        Box::pin(async { Ok(vec![]) })
    }

    fn cancel_run(&self, run_id: &str) -> BoxFuture<'_, GatewayResult<Run>> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.cancel_script.lock().unwrap();
        let result = match *script {
            CancelScript::Cancelled => Ok(self.build_run(run_id, RunStatus::Cancelled)),
            CancelScript::Conflict => Err(GatewayError::Api {
                status: 409,
                message: "run already finished".into(),
            }),
            CancelScript::Unreachable => {
                Err(GatewayError::Transport("connection refused".into()))
            }
        };
        Box::pin(async move { result })
    }

    fn validate_graph(
        &self,
        _definition: &GraphDefinition,
    ) -> BoxFuture<'_, GatewayResult<ValidationResult>> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(ValidationResult::ok()) })
    }

    fn create_project(&self, _req: CreateProjectRequest) -> BoxFuture<'_, GatewayResult<Project>> {
        Box::pin(async { Err(GatewayError::Transport("mock: projects unsupported".into())) })
    }

    fn get_project(&self, _project_id: &str) -> BoxFuture<'_, GatewayResult<Project>> {
        Box::pin(async { Err(GatewayError::Transport("mock: projects unsupported".into())) })
    }

    fn list_projects(&self) -> BoxFuture<'_, GatewayResult<Vec<Project>>> {
        Box::pin(async { Ok(vec![]) })
    }

    fn delete_project(&self, _project_id: &str) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn health(&self) -> BoxFuture<'_, GatewayResult<Health>> {
        Box::pin(async {
            Ok(Health {
                status: ConnectionStatus::Connected,
                version: Some("mock".into()),
            })
        })
    }
}

/// A gateway whose every endpoint fails at the transport level.
pub struct OfflineGateway;

impl PersistenceGateway for OfflineGateway {
    fn create_flow(&self, _req: CreateFlowRequest) -> BoxFuture<'_, GatewayResult<Flow>> {
        Box::pin(async { Err(GatewayError::Transport("connection refused".into())) })
    }

    fn get_flow(&self, _flow_id: &str) -> BoxFuture<'_, GatewayResult<Flow>> {
        Box::pin(async { Err(GatewayError::Transport("connection refused".into())) })
    }

    fn list_flows(&self) -> BoxFuture<'_, GatewayResult<Vec<FlowSummary>>> {
        Box::pin(async { Err(GatewayError::Transport("connection refused".into())) })
    }

    fn update_flow(
        &self,
        _flow_id: &str,
        _req: UpdateFlowRequest,
    ) -> BoxFuture<'_, GatewayResult<Flow>> {
        Box::pin(async { Err(GatewayError::Transport("connection refused".into())) })
    }

    fn delete_flow(&self, _flow_id: &str) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(async { Err(GatewayError::Transport("connection refused".into())) })
    }

    fn create_run(&self, _req: CreateRunRequest) -> BoxFuture<'_, GatewayResult<Run>> {
        Box::pin(async { Err(GatewayError::Transport("connection refused".into())) })
    }

    fn get_run(&self, _run_id: &str) -> BoxFuture<'_, GatewayResult<Run>> {
        Box::pin(async { Err(GatewayError::Transport("connection refused".into())) })
    }

    fn list_runs(&self, _flow_id: &str) -> BoxFuture<'_, GatewayResult<Vec<Run>>> {
        Box::pin(async { Err(GatewayError::Transport("connection refused".into())) })
    }

    fn cancel_run(&self, _run_id: &str) -> BoxFuture<'_, GatewayResult<Run>> {
        Box::pin(async { Err(GatewayError::Transport("connection refused".into())) })
    }

    fn validate_graph(
        &self,
        _definition: &GraphDefinition,
    ) -> BoxFuture<'_, GatewayResult<ValidationResult>> {
        Box::pin(async { Err(GatewayError::Transport("connection refused".into())) })
    }

    fn create_project(&self, _req: CreateProjectRequest) -> BoxFuture<'_, GatewayResult<Project>> {
        Box::pin(async { Err(GatewayError::Transport("connection refused".into())) })
    }

    fn get_project(&self, _project_id: &str) -> BoxFuture<'_, GatewayResult<Project>> {
        Box::pin(async { Err(GatewayError::Transport("connection refused".into())) })
    }

    fn list_projects(&self) -> BoxFuture<'_, GatewayResult<Vec<Project>>> {
        Box::pin(async { Err(GatewayError::Transport("connection refused".into())) })
    }

    fn delete_project(&self, _project_id: &str) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(async { Err(GatewayError::Transport("connection refused".into())) })
    }

    fn health(&self) -> BoxFuture<'_, GatewayResult<Health>> {
        Box::pin(async { Err(GatewayError::Transport("connection refused".into())) })
    }
}
