//! S5 — Supervisor restart within a run (spec.md §8).
//!
//! The Agent Pool keeps one [`oj_adapters::Supervisor`] per agent id for
//! the lifetime of the pool (spec §9 "one supervisor per workspace per
//! process"), built once from whatever backend config was registered at
//! first use; a later `register_backend` call does not reach an
//! already-spawned supervisor. So the single backend registered below
//! must describe both the crashing first attempt and the recovered
//! second attempt itself, via `FAKE_AGENT_CRASH_MARKER`.

use oj_adapters::AgentBackendConfig;
use oj_core::{AgentId, Config, FlowRunId, FlowStatus};

use super::common::{fake_agent_bin, harness, write_ticket, AGENT_ID};

#[tokio::test]
async fn a_mid_turn_crash_pauses_and_a_forced_resume_recovers() {
    let config = Config { auto_commit: false, ..Config::default() };
    let h = harness(config);
    let ticket_path = write_ticket(&h.workspace, 1, AGENT_ID, false, "First", "Do the thing.");

    let marker = tempfile::NamedTempFile::new().unwrap();
    std::fs::remove_file(marker.path()).unwrap();
    let done_contents = std::fs::read_to_string(&ticket_path).unwrap().replacen("done: false", "done: true", 1);

    let mut backend = AgentBackendConfig::new(fake_agent_bin().to_string_lossy().to_string());
    backend = backend.env("FAKE_AGENT_CRASH_MARKER", marker.path().to_string_lossy());
    backend = backend.env("FAKE_AGENT_WRITE_FILE", ticket_path.to_string_lossy());
    backend = backend.env("FAKE_AGENT_WRITE_CONTENTS", done_contents);
    h.pool.register_backend(AgentId::new(AGENT_ID), backend);

    let run_id = FlowRunId::new();
    h.controller.start_flow(run_id, h.input_data(), serde_json::json!({})).unwrap();
    let run = h.controller.run_flow(run_id).await.unwrap();

    assert_eq!(run.status, FlowStatus::Paused);
    let error = run.state["last_agent_error"].as_str().unwrap_or_default().to_string();
    assert!(error.contains("disconnected"), "last_agent_error was: {error}");
    assert_eq!(run.state["total_turns"], serde_json::json!(1));

    // An InfraError pause always passes the resume gate (spec §4.6
    // `check_resume_gate`), so `force=false` would already succeed here;
    // the scenario calls for `force=true` regardless.
    h.controller.resume_flow(run_id, true).unwrap();
    let run = h.controller.run_flow(run_id).await.unwrap();

    assert_eq!(run.status, FlowStatus::Completed);
    assert_eq!(run.state["total_turns"], serde_json::json!(2));
    assert_eq!(run.state["last_agent_error"], serde_json::Value::Null);
}
