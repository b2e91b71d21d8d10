//! Run orchestration: submit a validated graph snapshot, poll the backend
//! for status, fold traces back into the store, and support cancellation.
//!
//! State machine: `Idle → Submitting → Running → {Completed, Error,
//! Cancelled, Timeout}`. Terminal states have no outgoing transitions.
//!
//! At most one polling loop is active per orchestrator; starting a new one
//! synchronously tears down the previous via its cancellation token. Every
//! loop is stamped with a monotonically increasing epoch, and a response is
//! folded only while its `(run id, epoch)` still matches the active loop —
//! the last *request* wins, not the last response to arrive.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::gateway::{CreateRunRequest, GatewayError, GatewayResult, PersistenceGateway};
use crate::model::{GraphDefinition, NodeRunStatus, Run, RunStatus};
use crate::schema::SchemaRegistry;
use crate::store::GraphStore;
use crate::validate;

/// Orchestrator phase, mirroring the run's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Submitting,
    Running,
    Completed,
    Error,
    Cancelled,
    Timeout,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunPhase::Completed | RunPhase::Error | RunPhase::Cancelled | RunPhase::Timeout
        )
    }

    fn from_status(status: RunStatus) -> Self {
        match status {
            RunStatus::Pending | RunStatus::Running => RunPhase::Running,
            RunStatus::Completed => RunPhase::Completed,
            RunStatus::Error => RunPhase::Error,
            RunStatus::Cancelled => RunPhase::Cancelled,
            RunStatus::Timeout => RunPhase::Timeout,
        }
    }
}

/// Result of a submission attempt. Validation failures arrive here, not as
/// errors — and they guarantee zero gateway calls were made.
#[derive(Debug, Clone)]
pub struct ExecuteOutcome {
    pub success: bool,
    pub run_id: Option<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub success: bool,
    pub errors: Vec<String>,
}

/// Point-in-time view of the orchestrator for rendering.
#[derive(Debug, Clone)]
pub struct RunSnapshot {
    pub phase: RunPhase,
    pub run: Option<Run>,
    pub current_node: Option<String>,
}

struct ActivePoll {
    run_id: String,
    epoch: u64,
    cancel: CancellationToken,
}

struct OrchestratorState {
    phase: RunPhase,
    active_run: Option<Run>,
    current_node: Option<String>,
    poll: Option<ActivePoll>,
    epoch: u64,
}

type SharedState = Arc<Mutex<OrchestratorState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, OrchestratorState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct RunOrchestrator {
    store: Arc<GraphStore>,
    registry: Arc<SchemaRegistry>,
    gateway: Arc<dyn PersistenceGateway>,
    poll_interval: Duration,
    state: SharedState,
}

impl RunOrchestrator {
    pub fn new(
        store: Arc<GraphStore>,
        registry: Arc<SchemaRegistry>,
        gateway: Arc<dyn PersistenceGateway>,
        poll_interval: Duration,
    ) -> Self {
        RunOrchestrator {
            store,
            registry,
            gateway,
            poll_interval,
            state: Arc::new(Mutex::new(OrchestratorState {
                phase: RunPhase::Idle,
                active_run: None,
                current_node: None,
                poll: None,
                epoch: 0,
            })),
        }
    }

    pub fn snapshot(&self) -> RunSnapshot {
        let state = lock(&self.state);
        RunSnapshot {
            phase: state.phase,
            run: state.active_run.clone(),
            current_node: state.current_node.clone(),
        }
    }

    /// Validate the live graph and, only if it passes, submit it for
    /// execution. An invalid graph fails fast: no network call is made.
    pub async fn execute_flow(&self, timeout_seconds: Option<u64>) -> ExecuteOutcome {
        let definition = self.store.definition();
        let result = validate::validate_local(&definition, &self.registry);
        if !result.valid {
            info!(
                graph_id = %definition.graph_id,
                errors = result.errors.len(),
                "execution refused: graph is invalid"
            );
            return ExecuteOutcome {
                success: false,
                run_id: None,
                errors: result.errors,
            };
        }

        let flow_id = definition.graph_id.clone();
        self.submit(flow_id, definition, timeout_seconds).await
    }

    /// Submit a new run using a prior run's graph snapshot. The original
    /// run and its trace are left untouched.
    pub async fn rerun_flow(&self, run_id: &str) -> ExecuteOutcome {
        let prior = match self.gateway.get_run(run_id).await {
            Ok(run) => run,
            Err(e) => {
                return ExecuteOutcome {
                    success: false,
                    run_id: None,
                    errors: vec![e.to_string()],
                };
            }
        };

        let Some(definition) = prior.definition else {
            return ExecuteOutcome {
                success: false,
                run_id: None,
                errors: vec![format!("run '{}' has no graph snapshot to rerun", run_id)],
            };
        };

        // Contracts may have moved since the snapshot ran.
        let result = validate::validate_local(&definition, &self.registry);
        if !result.valid {
            return ExecuteOutcome {
                success: false,
                run_id: None,
                errors: result.errors,
            };
        }

        self.submit(prior.flow_id, definition, None).await
    }

    async fn submit(
        &self,
        flow_id: String,
        definition: GraphDefinition,
        timeout_seconds: Option<u64>,
    ) -> ExecuteOutcome {
        lock(&self.state).phase = RunPhase::Submitting;

        let req = CreateRunRequest {
            flow_id,
            definition,
            timeout_seconds,
        };

        match self.gateway.create_run(req).await {
            Ok(run) => {
                info!(run_id = %run.id, status = %run.status, "run submitted");
                self.store.reset_statuses();
                let run_id = run.id.clone();

                if run.status.is_terminal() {
                    // Backend finished synchronously; nothing to poll.
                    self.store.apply_trace(&run.trace);
                    let mut state = lock(&self.state);
                    state.phase = RunPhase::from_status(run.status);
                    state.active_run = Some(run);
                    state.current_node = None;
                } else {
                    {
                        let mut state = lock(&self.state);
                        state.phase = RunPhase::Running;
                        state.active_run = Some(run);
                        state.current_node = None;
                    }
                    self.start_polling(&run_id);
                }

                ExecuteOutcome {
                    success: true,
                    run_id: Some(run_id),
                    errors: vec![],
                }
            }
            Err(e) => {
                warn!(error = %e, "run submission failed");
                lock(&self.state).phase = RunPhase::Idle;
                ExecuteOutcome {
                    success: false,
                    run_id: None,
                    errors: vec![e.to_string()],
                }
            }
        }
    }

    /// Start the polling loop for `run_id`. Polling is not additive: any
    /// previous loop is cancelled synchronously before the new one starts.
    pub fn start_polling(&self, run_id: &str) {
        let (cancel, epoch) = {
            let mut state = lock(&self.state);
            if let Some(previous) = state.poll.take() {
                debug!(run_id = %previous.run_id, "superseded poll loop stopped");
                previous.cancel.cancel();
            }
            state.epoch += 1;
            let token = CancellationToken::new();
            state.poll = Some(ActivePoll {
                run_id: run_id.to_string(),
                epoch: state.epoch,
                cancel: token.clone(),
            });
            (token, state.epoch)
        };

        let worker = PollWorker {
            state: Arc::clone(&self.state),
            store: Arc::clone(&self.store),
            gateway: Arc::clone(&self.gateway),
            poll_interval: self.poll_interval,
        };
        let run_id = run_id.to_string();
        tokio::spawn(async move {
            worker.run(run_id, epoch, cancel).await;
        });
    }

    /// Stop the active polling loop, if any. Responses already in flight for
    /// it become stale and are discarded on arrival.
    pub fn stop_polling(&self) {
        let mut state = lock(&self.state);
        if let Some(poll) = state.poll.take() {
            debug!(run_id = %poll.run_id, "poll loop stopped");
            poll.cancel.cancel();
        }
    }

    /// Teardown hook: clears the polling loop and resets to `Idle`.
    pub fn shutdown(&self) {
        let mut state = lock(&self.state);
        if let Some(poll) = state.poll.take() {
            poll.cancel.cancel();
        }
        state.phase = RunPhase::Idle;
        state.active_run = None;
        state.current_node = None;
    }

    /// Best-effort, idempotent cancellation. A run that is already terminal
    /// (locally or server-side) makes this a successful no-op.
    pub async fn cancel_run(&self, run_id: &str) -> CancelOutcome {
        {
            let state = lock(&self.state);
            if let Some(active) = &state.active_run {
                if active.id == run_id && active.status.is_terminal() {
                    debug!(run_id, "cancel of terminal run is a no-op");
                    return CancelOutcome {
                        success: true,
                        errors: vec![],
                    };
                }
            }
        }

        match self.gateway.cancel_run(run_id).await {
            Ok(run) => {
                let terminal = run.status.is_terminal();
                {
                    let mut state = lock(&self.state);
                    let is_active_poll =
                        state.poll.as_ref().is_some_and(|p| p.run_id == run_id);
                    if terminal && is_active_poll {
                        if let Some(poll) = state.poll.take() {
                            poll.cancel.cancel();
                        }
                        state.current_node = None;
                    }
                    if is_active_poll
                        || state.active_run.as_ref().is_some_and(|r| r.id == run_id)
                    {
                        state.phase = RunPhase::from_status(run.status);
                        state.active_run = Some(run.clone());
                    }
                }
                if terminal {
                    self.store.apply_trace(&run.trace);
                }
                info!(run_id, status = %run.status, "run cancellation acknowledged");
                CancelOutcome {
                    success: true,
                    errors: vec![],
                }
            }
            // The backend rejects cancellation of an already-finished run
            // with a conflict; that still satisfies the caller's intent.
            Err(GatewayError::Api { status: 409, .. }) => CancelOutcome {
                success: true,
                errors: vec![],
            },
            Err(e) => CancelOutcome {
                success: false,
                errors: vec![e.to_string()],
            },
        }
    }

    /// Read-only fetch of a run. Folded into view state only when no poll
    /// loop is active, so browsing history never clobbers a live run.
    pub async fn load_run(&self, run_id: &str) -> GatewayResult<Run> {
        let run = self.gateway.get_run(run_id).await?;
        let mut state = lock(&self.state);
        if state.poll.is_none() {
            state.phase = RunPhase::from_status(run.status);
            state.active_run = Some(run.clone());
            state.current_node = None;
            drop(state);
            self.store.apply_trace(&run.trace);
        }
        Ok(run)
    }
}

/// The spawned half of a polling loop. Holds only shared handles so the
/// orchestrator itself never needs to be reference-counted.
struct PollWorker {
    state: SharedState,
    store: Arc<GraphStore>,
    gateway: Arc<dyn PersistenceGateway>,
    poll_interval: Duration,
}

impl PollWorker {
    async fn run(&self, run_id: String, epoch: u64, cancel: CancellationToken) {
        debug!(run_id = %run_id, epoch, "poll loop started");
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = cancel.cancelled() => {
                    debug!(run_id = %run_id, "poll loop cancelled");
                    return;
                }
            }

            match self.gateway.get_run(&run_id).await {
                Ok(run) => {
                    if !self.fold(&run_id, epoch, run) {
                        return;
                    }
                }
                Err(e) => {
                    // Transient transport failure; the next tick retries.
                    warn!(run_id = %run_id, error = %e, "run status fetch failed");
                }
            }
        }
    }

    /// Fold one poll response into state. Returns `false` when the loop must
    /// stop (terminal status reached, or the loop was superseded).
    fn fold(&self, run_id: &str, epoch: u64, run: Run) -> bool {
        let mut state = lock(&self.state);

        let still_active = state
            .poll
            .as_ref()
            .is_some_and(|p| p.run_id == run_id && p.epoch == epoch);
        if !still_active {
            debug!(run_id, "stale poll response discarded");
            return false;
        }
        if run.id != run_id {
            warn!(run_id, got = %run.id, "poll response for a different run ignored");
            return true;
        }

        if run.status.is_terminal() {
            info!(run_id, status = %run.status, "run reached terminal status");
            self.store.apply_trace(&run.trace);
            state.phase = RunPhase::from_status(run.status);
            state.current_node = None;
            state.active_run = Some(run);
            state.poll = None;
            return false;
        }

        self.store.apply_trace(&run.trace);
        state.current_node = run
            .trace
            .iter()
            .rev()
            .find(|t| t.status == NodeRunStatus::Running)
            .map(|t| t.node_id.clone());
        state.phase = RunPhase::Running;
        state.active_run = Some(run);
        true
    }
}
