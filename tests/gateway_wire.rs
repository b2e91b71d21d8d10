//! Normalization of duck-typed backend payloads into canonical types.

use studio_core::gateway::wire::{RawFlow, RawRun};
use studio_core::model::{NodeRunStatus, RunStatus};

#[test]
fn flow_payload_with_snake_case_flow_id_normalizes() {
    let json = r#"{
        "flow_id": "f-1",
        "name": "Inbox triage",
        "graph": { "graphId": "f-1", "contractVersion": 1, "nodes": [], "edges": [] },
        "created_at": "2026-05-01T09:30:00Z",
        "updated_at": "2026-05-02T10:00:00Z"
    }"#;

    let raw: RawFlow = serde_json::from_str(json).expect("payload parses");
    let flow = raw.normalize().expect("payload normalizes");
    assert_eq!(flow.id, "f-1");
    assert_eq!(flow.name, "Inbox triage");
    assert_eq!(flow.definition.graph_id, "f-1");
}

#[test]
fn flow_payload_with_camel_case_id_normalizes() {
    let json = r#"{
        "flowId": "f-2",
        "name": "Daily digest",
        "definition": { "graphId": "f-2", "contractVersion": 1, "nodes": [], "edges": [] },
        "createdAt": "2026-05-01T09:30:00Z",
        "updatedAt": "2026-05-02T10:00:00Z"
    }"#;

    let raw: RawFlow = serde_json::from_str(json).expect("payload parses");
    assert_eq!(raw.normalize().expect("payload normalizes").id, "f-2");
}

#[test]
fn flow_payload_without_any_id_is_rejected() {
    let json = r#"{
        "name": "Orphan",
        "definition": { "graphId": "x", "contractVersion": 1, "nodes": [], "edges": [] },
        "createdAt": "2026-05-01T09:30:00Z",
        "updatedAt": "2026-05-01T09:30:00Z"
    }"#;

    let raw: RawFlow = serde_json::from_str(json).expect("payload parses");
    assert!(raw.normalize().is_err());
}

#[test]
fn run_payload_with_mixed_conventions_normalizes() {
    let json = r#"{
        "run_id": "r-9",
        "flowId": "f-1",
        "status": "running",
        "trace": [
            {
                "node_id": "t1",
                "status": "success",
                "output": {"ok": true},
                "started_at": "2026-05-02T10:00:00Z",
                "ended_at": "2026-05-02T10:00:01Z",
                "duration_ms": 850
            }
        ],
        "created_at": "2026-05-02T10:00:00Z"
    }"#;

    let raw: RawRun = serde_json::from_str(json).expect("payload parses");
    let run = raw.normalize().expect("payload normalizes");
    assert_eq!(run.id, "r-9");
    assert_eq!(run.flow_id, "f-1");
    assert_eq!(run.status, RunStatus::Running);
    assert_eq!(run.trace.len(), 1);
    assert_eq!(run.trace[0].node_id, "t1");
    assert_eq!(run.trace[0].status, NodeRunStatus::Success);
    assert_eq!(run.trace[0].duration_ms, 850);
}

#[test]
fn run_payload_with_camel_case_trace_normalizes() {
    let json = r#"{
        "id": "r-10",
        "flow_id": "f-1",
        "status": "completed",
        "trace": [
            {
                "nodeId": "r1",
                "status": "success",
                "startedAt": "2026-05-02T10:00:02Z",
                "durationMs": 120
            }
        ],
        "startedAt": "2026-05-02T10:00:00Z",
        "endedAt": "2026-05-02T10:00:03Z"
    }"#;

    let raw: RawRun = serde_json::from_str(json).expect("payload parses");
    let run = raw.normalize().expect("payload normalizes");
    assert_eq!(run.id, "r-10");
    assert_eq!(run.status, RunStatus::Completed);
    assert!(run.ended_at.is_some());
    assert_eq!(run.trace[0].node_id, "r1");
}

#[test]
fn run_status_strings_map_onto_the_full_lifecycle() {
    for (text, expected) in [
        ("pending", RunStatus::Pending),
        ("running", RunStatus::Running),
        ("completed", RunStatus::Completed),
        ("error", RunStatus::Error),
        ("cancelled", RunStatus::Cancelled),
        ("timeout", RunStatus::Timeout),
    ] {
        let status: RunStatus =
            serde_json::from_str(&format!("\"{}\"", text)).expect("status parses");
        assert_eq!(status, expected);
        assert_eq!(
            status.is_terminal(),
            !matches!(expected, RunStatus::Pending | RunStatus::Running)
        );
    }
}
