//! S3 — Resume gate unblocked by a repo fingerprint change (spec.md §8).

use oj_adapters::AgentBackendConfig;
use oj_core::{AgentId, Config, FlowRunId, FlowStatus};

use super::common::{fake_agent_bin, harness, write_ticket, AGENT_ID};

#[tokio::test]
async fn touching_a_tracked_file_unblocks_an_unforced_resume() {
    let config = Config { auto_commit: false, ..Config::default() };
    let h = harness(config);
    write_ticket(&h.workspace, 1, AGENT_ID, false, "First", "Do the thing.");

    let run_id = FlowRunId::new();
    let run_dir = h.run_dir(run_id);
    let dispatch_contents = "---\nmode: pause\ntitle: \"Need approval\"\n---\n\nProceed?\n".to_string();

    let mut backend = AgentBackendConfig::new(fake_agent_bin().to_string_lossy().to_string());
    backend = backend.env("FAKE_AGENT_WRITE_FILE", run_dir.join("DISPATCH.md").to_string_lossy());
    backend = backend.env("FAKE_AGENT_WRITE_CONTENTS", dispatch_contents);
    h.pool.register_backend(AgentId::new(AGENT_ID), backend);

    h.controller.start_flow(run_id, h.input_data(), serde_json::json!({})).unwrap();
    let run = h.controller.run_flow(run_id).await.unwrap();
    assert_eq!(run.status, FlowStatus::Paused);
    assert_eq!(run.state["reply_seq"], serde_json::json!(0));

    assert!(h.controller.resume_flow(run_id, false).is_err());

    // Touch a tracked file outside the runs directory, changing the repo
    // fingerprint the resume gate compares against (spec §8 property #6,
    // §9 fingerprint definition).
    std::fs::write(h.workspace.join("README.md"), "touched\n").unwrap();

    let resumed = h.controller.resume_flow(run_id, false).unwrap();
    assert_eq!(resumed.status, FlowStatus::Running);
    assert_eq!(resumed.state["reply_seq"], serde_json::json!(0));
}
