//! S6 — Sandbox normalization (spec.md §8 property #10, scenario S6).
//!
//! The Ticket Engine always requests [`oj_core::SandboxPolicy::default`]
//! per turn (spec §4.5 step 6 does not yet thread a per-ticket sandbox
//! policy through); what varies across the listed inputs is purely
//! `oj_wire::normalize_sandbox_policy`'s parsing, exercised directly here,
//! plus one end-to-end check that whatever policy the Ticket Engine picks
//! really does reach the wire in its canonical `{type: ...}` form.

use oj_adapters::AgentBackendConfig;
use oj_core::{AgentId, Config, FlowRunId, FlowStatus, SandboxPolicy};
use oj_wire::normalize_sandbox_policy;

use super::common::{fake_agent_bin, harness, write_ticket, AGENT_ID};

#[test]
fn normalizes_every_spelling_of_danger_full_access() {
    let inputs = [
        serde_json::json!("danger-full-access"),
        serde_json::json!("dangerFullAccess"),
        serde_json::json!("DANGER_FULL_ACCESS"),
        serde_json::json!({"type": "danger_full_access"}),
    ];
    for input in &inputs {
        let normalized = normalize_sandbox_policy(input).unwrap_or_else(|| panic!("failed to normalize {input}"));
        assert_eq!(normalized, SandboxPolicy::DangerFullAccess);
        assert_eq!(normalized.to_wire_value(), serde_json::json!({"type": "dangerFullAccess"}));
    }
}

#[tokio::test]
async fn the_turn_s_sandbox_policy_reaches_the_wire_verbatim() {
    let h = harness(Config::default());
    write_ticket(&h.workspace, 1, AGENT_ID, false, "First", "Do the thing.");

    let policy_file = tempfile::NamedTempFile::new().unwrap();
    let mut backend = AgentBackendConfig::new(fake_agent_bin().to_string_lossy().to_string());
    backend = backend.env("FAKE_AGENT_RECORD_SANDBOX_POLICY", policy_file.path().to_string_lossy());
    h.pool.register_backend(AgentId::new(AGENT_ID), backend);

    let run_id = FlowRunId::new();
    h.controller.start_flow(run_id, h.input_data(), serde_json::json!({})).unwrap();
    let run = h.controller.run_flow(run_id).await.unwrap();

    // The ticket has no write side effect, so it never becomes `done`; the
    // run pauses on the global turn budget or keeps going, but either way
    // at least one turn ran and recorded the wire value.
    assert_ne!(run.status, FlowStatus::Failed);

    let recorded = std::fs::read_to_string(policy_file.path()).unwrap();
    let recorded: serde_json::Value = serde_json::from_str(&recorded).unwrap();
    assert_eq!(recorded, SandboxPolicy::default().to_wire_value());
}
