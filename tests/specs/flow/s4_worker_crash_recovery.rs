//! S4 — Worker crash recovery (spec.md §8).
//!
//! The literal scenario text describes `ResumeFlow(force=true)` re-running
//! a reconciler-stopped run, but `stopped` is one of the terminal statuses
//! (spec.md line ~159: "If status is terminal (completed/failed/stopped ≠
//! resumable), return immediately") and `FlowController::resume_flow`
//! rejects any terminal run regardless of `force`. This test asserts the
//! reconciler's half of S4 literally, and asserts the documented,
//! deliberate deviation for the second half (see DESIGN.md).

use std::path::Path;
use std::sync::Arc;

use oj_core::{Config, FlowRunId, FlowStatus, WorkerCheck};
use oj_engine::{Reconciler, WorkerChecker};
use oj_storage::StatusUpdate;

use super::common::harness;

struct AlwaysDead;

impl WorkerChecker for AlwaysDead {
    fn check(&self, _run_id: FlowRunId, _run_dir: &Path) -> WorkerCheck {
        WorkerCheck { alive: false, pid: None, message: "no .worker sidecar".to_string() }
    }
}

#[tokio::test]
async fn reconciler_stops_a_run_with_no_live_worker() {
    let h = harness(Config::default());
    let run_id = FlowRunId::new();
    h.controller.start_flow(run_id, h.input_data(), serde_json::json!({})).unwrap();

    // Simulate a worker that began running and then vanished without a
    // trace, leaving the run's status stuck at `running`.
    h.controller.store().update_status(run_id, FlowStatus::Running, StatusUpdate::default()).unwrap();

    let reconciler = Reconciler::new(Arc::clone(h.controller.store()), Arc::new(AlwaysDead), oj_core::SystemClock);
    let report = reconciler.scan_once().unwrap();

    assert_eq!(report.scanned, 1);
    assert_eq!(report.transitioned, vec![run_id]);

    let run = h.controller.get_status(run_id).unwrap();
    assert_eq!(run.status, FlowStatus::Stopped);
    assert_eq!(run.error_message.as_deref(), Some("worker missing"));

    // `stopped` is terminal: a forced resume is correctly rejected rather
    // than literally re-running the flow.
    assert!(h.controller.resume_flow(run_id, true).is_err());
}
