use oj_core::FakeClock;

use super::*;

struct FixedChecker {
    alive: bool,
}

impl WorkerChecker for FixedChecker {
    fn check(&self, _run_id: FlowRunId, _run_dir: &Path) -> WorkerCheck {
        WorkerCheck { alive: self.alive, pid: None, message: "fixture".to_string() }
    }
}

fn running_run(store: &FlowStore) -> FlowRunId {
    let id = FlowRunId::new();
    store.create_run(id, "ticket_flow", serde_json::json!({}), serde_json::json!({}), 0).unwrap();
    store
        .update_status(id, FlowStatus::Running, StatusUpdate { started_at: Some(0), ..Default::default() })
        .unwrap();
    id
}

#[test]
fn live_worker_is_left_alone() {
    let store = Arc::new(FlowStore::open_in_memory().unwrap());
    let run_id = running_run(&store);
    let reconciler = Reconciler::new(store.clone(), Arc::new(FixedChecker { alive: true }), FakeClock::new());

    let report = reconciler.scan_once().unwrap();
    assert_eq!(report.scanned, 1);
    assert!(report.transitioned.is_empty());
    assert_eq!(store.get_run(run_id).unwrap().unwrap().status, FlowStatus::Running);
}

#[test]
fn dead_worker_transitions_run_to_stopped() {
    let store = Arc::new(FlowStore::open_in_memory().unwrap());
    let run_id = running_run(&store);
    let reconciler = Reconciler::new(store.clone(), Arc::new(FixedChecker { alive: false }), FakeClock::new());

    let report = reconciler.scan_once().unwrap();
    assert_eq!(report.transitioned, vec![run_id]);

    let run = store.get_run(run_id).unwrap().unwrap();
    assert_eq!(run.status, FlowStatus::Stopped);
    assert!(run.upholds_terminality_invariant());
    assert_eq!(run.error_message.as_deref(), Some("worker missing"));

    let events = store.list_events(run_id).unwrap();
    assert!(events.iter().any(|e| e.event_type == FlowEventType::FlowStopped));
}

#[test]
fn paused_runs_are_never_scanned() {
    let store = Arc::new(FlowStore::open_in_memory().unwrap());
    let id = FlowRunId::new();
    store.create_run(id, "ticket_flow", serde_json::json!({}), serde_json::json!({}), 0).unwrap();
    store
        .update_status(
            id,
            FlowStatus::Paused,
            StatusUpdate { current_step: Some(Some("ticket_flow".into())), started_at: Some(0), ..Default::default() },
        )
        .unwrap();

    let reconciler = Reconciler::new(store.clone(), Arc::new(FixedChecker { alive: false }), FakeClock::new());
    let report = reconciler.scan_once().unwrap();
    assert_eq!(report.scanned, 0);
    assert_eq!(store.get_run(id).unwrap().unwrap().status, FlowStatus::Paused);
}

#[test]
fn rescanning_a_stopped_run_is_idempotent() {
    let store = Arc::new(FlowStore::open_in_memory().unwrap());
    let run_id = running_run(&store);
    let reconciler = Reconciler::new(store.clone(), Arc::new(FixedChecker { alive: false }), FakeClock::new());

    reconciler.scan_once().unwrap();
    let report = reconciler.scan_once().unwrap();
    assert_eq!(report.scanned, 0);
    assert!(report.transitioned.is_empty());
}
