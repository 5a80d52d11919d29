//! S1 — Happy path, single ticket (spec.md §8).

use std::collections::HashMap;

use oj_adapters::AgentBackendConfig;
use oj_core::{AgentId, Config, FlowRunId, FlowStatus};

use super::common::{harness, fake_agent_bin, write_ticket, AGENT_ID};

#[tokio::test]
async fn single_ticket_completes_in_one_turn_with_no_dispatch_entries() {
    let h = harness(Config::default());
    let ticket_path = write_ticket(&h.workspace, 1, AGENT_ID, false, "First", "Do the thing.");

    // The agent rewrites the ticket with `done: true` as part of the turn,
    // mirroring a real backend editing the file it was asked to finish.
    let done_contents = std::fs::read_to_string(&ticket_path)
        .unwrap()
        .replacen("done: false", "done: true", 1);
    let mut backend = AgentBackendConfig::new(fake_agent_bin().to_string_lossy().to_string());
    backend = backend.env("FAKE_AGENT_WRITE_FILE", ticket_path.to_string_lossy());
    backend = backend.env("FAKE_AGENT_WRITE_CONTENTS", done_contents);
    backend = backend.env("FAKE_AGENT_TEXT", "done");
    h.pool.register_backend(AgentId::new(AGENT_ID), backend);

    let run_id = FlowRunId::new();
    h.controller.start_flow(run_id, h.input_data(), serde_json::json!({})).unwrap();
    let run = h.controller.run_flow(run_id).await.unwrap();

    assert_eq!(run.status, FlowStatus::Completed);
    assert_eq!(run.state["total_turns"], serde_json::json!(1));

    let events = h.controller.store().list_events(run_id).unwrap();
    let started = events.iter().filter(|e| matches!(e.event_type, oj_core::FlowEventType::FlowStarted)).count();
    let completed = events.iter().filter(|e| matches!(e.event_type, oj_core::FlowEventType::FlowCompleted)).count();
    assert_eq!(started, 1);
    assert_eq!(completed, 1);

    let dispatch_history = h.run_dir(run_id).join("dispatch_history");
    assert!(!dispatch_history.exists() || std::fs::read_dir(&dispatch_history).unwrap().next().is_none());
}
