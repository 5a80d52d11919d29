//! S2 — Pause-for-input via dispatch (spec.md §8).
//!
//! The fake agent's subprocess never disconnects between the pause and the
//! resume here, so the same [`oj_adapters::Supervisor`] (and the same
//! fake-agent process) serves both turns — a second `register_backend` call
//! made in between would not reach it (spec §9 "one supervisor per
//! workspace per process"). The single backend registered below instead
//! varies its behavior by the fake agent's own turn counter: it writes
//! `DISPATCH.md` on turn one and marks the ticket done on turn two.

use oj_adapters::AgentBackendConfig;
use oj_core::{AgentId, Config, FlowEventType, FlowRunId, FlowStatus};

use super::common::{fake_agent_bin, harness, write_reply, write_ticket, AGENT_ID};

#[tokio::test]
async fn dispatch_pause_blocks_resume_until_a_reply_arrives() {
    let config = Config { auto_commit: false, ..Config::default() };
    let h = harness(config);
    let ticket_path = write_ticket(&h.workspace, 1, AGENT_ID, false, "First", "Do the thing.");

    let run_id = FlowRunId::new();
    let run_dir = h.run_dir(run_id);
    let dispatch_contents = "---\nmode: pause\ntitle: \"Need approval\"\n---\n\nProceed?\n".to_string();
    let done_contents = std::fs::read_to_string(&ticket_path).unwrap().replacen("done: false", "done: true", 1);

    let mut backend = AgentBackendConfig::new(fake_agent_bin().to_string_lossy().to_string());
    backend = backend.env("FAKE_AGENT_WRITE_FILE", run_dir.join("DISPATCH.md").to_string_lossy());
    backend = backend.env("FAKE_AGENT_WRITE_CONTENTS", dispatch_contents);
    backend = backend.env("FAKE_AGENT_WRITE_FILE_2", ticket_path.to_string_lossy());
    backend = backend.env("FAKE_AGENT_WRITE_CONTENTS_2", done_contents);
    backend = backend.env("FAKE_AGENT_ECHO_PROMPT", "1");
    h.pool.register_backend(AgentId::new(AGENT_ID), backend);

    h.controller.start_flow(run_id, h.input_data(), serde_json::json!({})).unwrap();
    let run = h.controller.run_flow(run_id).await.unwrap();

    assert_eq!(run.status, FlowStatus::Paused);
    let events = h.controller.store().list_events(run_id).unwrap();
    let paused_reason = events
        .iter()
        .find(|e| matches!(e.event_type, FlowEventType::FlowPaused))
        .and_then(|e| e.data.get("reason"))
        .and_then(|r| r.as_str())
        .map(str::to_string);
    assert_eq!(paused_reason.as_deref(), Some("Need approval"));

    let archived = run_dir.join("dispatch_history").join("0001").join("DISPATCH.md");
    assert!(archived.exists());
    assert!(!run_dir.join("DISPATCH.md").exists());

    // No new reply, no repo change since the pause: the gate rejects an
    // unforced resume (spec §8 property #6).
    assert!(h.controller.resume_flow(run_id, false).is_err());

    write_reply(&run_dir, "Approved.\n");

    // Writing USER_REPLY.md is enough for an unforced resume to succeed
    // (spec §8 S2), even though the engine itself only archives the reply
    // on the next step.
    h.controller.resume_flow(run_id, false).unwrap();
    let run = h.controller.run_flow(run_id).await.unwrap();

    assert_eq!(run.status, FlowStatus::Completed);
    assert_eq!(run.state["reply_seq"], serde_json::json!(1));
    let prompt = run.state["last_agent_output"].as_str().unwrap_or_default().to_string();
    assert!(prompt.contains("[USER_REPLY 0001]"), "prompt was: {prompt}");
    assert!(prompt.contains("Approved."), "prompt was: {prompt}");

    let reply_history_dir = run_dir.join("reply_history").join("0001").join("USER_REPLY.md");
    assert!(reply_history_dir.exists());
    assert!(!run_dir.join("USER_REPLY.md").exists());
}
